//! Static root page (`<output>/index.html`) linking every produced artifact.

use crate::error::{PackageError, Result};
use crate::packager::{Artifact, Release};
use crate::paths;
use std::fs;
use std::path::{Path, PathBuf};

const EMPTY_ROW: &str = "<tr><td colspan='5'>No firmware artifacts generated.</td></tr>";

/// Escape text for use in element content and single-quoted attributes.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn row(artifact: &Artifact) -> String {
    let zip = match &artifact.archive_path {
        Some(zip) => format!("<a href='{}'>zip</a>", escape(zip)),
        None => "n/a".to_string(),
    };
    format!(
        "<tr><td>{}</td><td>{}</td><td><a href='{}'>manifest</a></td><td><a href='{}'>binary</a></td><td>{}</td></tr>",
        escape(artifact.target.chip),
        escape(artifact.target.env),
        escape(&artifact.manifest_path),
        escape(&artifact.binary_path),
        zip,
    )
}

/// Render the page. Rows follow `artifacts` order; the output depends only
/// on its inputs.
pub fn render_root_index(release: &Release, artifacts: &[Artifact]) -> String {
    let table_rows = if artifacts.is_empty() {
        EMPTY_ROW.to_string()
    } else {
        artifacts.iter().map(row).collect::<Vec<_>>().join("\n")
    };

    let version = escape(&release.version);
    let channel = escape(&release.channel);
    let published_at = escape(&release.published_at);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <title>Firmware packages {version}</title>
  <style>
    body {{ font-family: system-ui, sans-serif; margin: 2rem; }}
    table {{ border-collapse: collapse; min-width: 60%; }}
    th, td {{ border: 1px solid #ccc; padding: 0.5rem 0.75rem; text-align: left; }}
    th {{ background: #f5f5f5; }}
  </style>
</head>
<body>
  <h1>Firmware packages ({version})</h1>
  <p>Channel: <strong>{channel}</strong> &middot; Published at: <strong>{published_at}</strong></p>
  <p>Firmware bundles generated by the release workflow. Devices should download the manifest matching their chip.</p>
  <table>
    <thead>
      <tr><th>Chip</th><th>Environment</th><th>Manifest</th><th>Binary</th><th>Zip</th></tr>
    </thead>
    <tbody>
      {table_rows}
    </tbody>
  </table>
</body>
</html>
"#
    )
}

/// Write `<output>/index.html`. Always written, even for an empty run.
///
/// # Errors
///
/// I/O failures.
pub fn write_root_index(output: &Path, release: &Release, artifacts: &[Artifact]) -> Result<PathBuf> {
    fs::create_dir_all(output)
        .map_err(|e| PackageError::io("Failed to create output directory", output, e))?;

    let path = paths::root_index_path(output);
    fs::write(&path, render_root_index(release, artifacts))
        .map_err(|e| PackageError::io("Failed to write root index", &path, e))?;
    tracing::debug!("wrote {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry;
    use otapack_schema::Md5Digest;

    fn release() -> Release {
        Release::new("v1.2.3".into(), "stable", Some("2026-01-02T03:04:05+00:00")).unwrap()
    }

    fn artifact(env: &str, zip: Option<&str>) -> Artifact {
        let target = registry::lookup(env).unwrap();
        Artifact {
            target,
            version: "v1.2.3".into(),
            channel: "stable".into(),
            size: 1,
            md5: Md5Digest::compute(b"x"),
            binary_path: format!("firmware/{env}/stable/{env}-v1.2.3.bin"),
            manifest_path: format!("firmware/{env}/stable/manifest.json"),
            archive_path: zip.map(str::to_string),
        }
    }

    #[test]
    fn empty_run_has_explanatory_row() {
        let html = render_root_index(&release(), &[]);
        assert!(html.contains("No firmware artifacts generated."));
        assert_eq!(html.matches("<tr><td").count(), 1);
    }

    #[test]
    fn one_row_per_artifact_in_order() {
        let artifacts = [
            artifact("esp32", Some("releases/esp32-v1.2.3.zip")),
            artifact("esp8266", None),
        ];
        let html = render_root_index(&release(), &artifacts);

        assert_eq!(html.matches("<tr><td>").count(), 2);
        let esp32 = html.find("<td>esp32</td>").unwrap();
        let esp8266 = html.find("<td>esp8266</td>").unwrap();
        assert!(esp32 < esp8266);
        assert!(html.contains("<a href='releases/esp32-v1.2.3.zip'>zip</a>"));
        assert!(html.contains("<td>n/a</td>"));
        assert!(html.contains("Channel: <strong>stable</strong>"));
    }

    #[test]
    fn rendering_is_deterministic_and_escaped() {
        let release =
            Release::new("v1<script>".into(), "stable", Some("2026-01-02T03:04:05+00:00")).unwrap();
        let artifacts = [artifact("esp32", None)];
        let a = render_root_index(&release, &artifacts);
        let b = render_root_index(&release, &artifacts);
        assert_eq!(a, b);
        assert!(a.contains("v1&lt;script&gt;"));
        assert!(!a.contains("<script>"));
    }
}
