use crate::error::Result;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::{fs::OpenOptions, io::AsyncWriteExt, sync::Mutex};

/// Append-only NDJSON log of raw forwarded packets.
///
/// Each call to [`AuditLog::append`] writes one line. The file is never read
/// back.
#[derive(Debug)]
pub struct AuditLog {
    path: PathBuf,
    file: Mutex<tokio::fs::File>,
}

impl AuditLog {
    /// Open the log for appending, creating it if needed. With `truncate`
    /// set, any previous contents are discarded first.
    pub async fn open(path: impl AsRef<Path>, truncate: bool) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        if truncate {
            tokio::fs::File::create(&path).await?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `packet` as one compact JSON line.
    pub async fn append(&self, packet: &Value) -> Result<()> {
        let mut line = serde_json::to_vec(packet)?;
        line.push(b'\n');

        let mut file = self.file.lock().await;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn appends_one_line_per_packet() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::open(dir.path().join("data.ndjson"), true)
            .await
            .unwrap();

        log.append(&json!([{ "a": 1 }])).await.unwrap();
        log.append(&json!({ "text": "héllo 😀\nnext" })).await.unwrap();

        let contents = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"[{"a":1}]"#);
        let second: Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["text"], "héllo 😀\nnext");
        assert!(lines[1].contains("😀"));
    }

    #[tokio::test]
    async fn truncate_controls_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("data.ndjson");

        let log = AuditLog::open(&path, true).await.unwrap();
        log.append(&json!(1)).await.unwrap();
        drop(log);

        let log = AuditLog::open(&path, false).await.unwrap();
        log.append(&json!(2)).await.unwrap();
        drop(log);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1\n2\n");

        let log = AuditLog::open(&path, true).await.unwrap();
        log.append(&json!(3)).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "3\n");
    }
}
