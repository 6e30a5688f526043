use std::path::Path;

use tracing::warn;

/// Read the greeting shown to every new connection. Lines are normalized to
/// end in `\n` and invalid UTF-8 is replaced. An unreadable file yields an
/// empty banner.
pub async fn load(path: &Path) -> String {
    match tokio::fs::read(path).await {
        Ok(contents) => normalize(&String::from_utf8_lossy(&contents)),
        Err(e) => {
            warn!(path = %path.display(), "failed to read banner: {e}");
            String::new()
        }
    }
}

fn normalize(contents: &str) -> String {
    contents.lines().fold(String::new(), |mut out, line| {
        out.push_str(line);
        out.push('\n');
        out
    })
}
