use async_trait::async_trait;

use crate::error::AppError;

/// Opens a URL outside the client (browser, OS handler).
#[async_trait]
pub trait LinkOpener: Send + Sync {
    async fn can_open(&self, url: &str) -> bool;

    async fn open(&self, url: &str) -> Result<(), AppError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    Opened,
    /// `can_open` said no; nothing was attempted.
    Unopenable(String),
    Failed(String),
}

impl LinkOutcome {
    pub fn user_message(&self) -> Option<String> {
        match self {
            LinkOutcome::Opened => None,
            LinkOutcome::Unopenable(url) => Some(format!("Can't open link: {url}")),
            LinkOutcome::Failed(msg) => Some(format!("Can't open link: {msg}")),
        }
    }
}

/// Check before opening, and never let a failure escape as an error.
pub async fn open_checked(opener: &dyn LinkOpener, url: &str) -> LinkOutcome {
    if !opener.can_open(url).await {
        tracing::warn!(%url, "Link cannot be opened");
        return LinkOutcome::Unopenable(url.to_string());
    }
    match opener.open(url).await {
        Ok(()) => LinkOutcome::Opened,
        Err(e) => {
            tracing::warn!(%url, "Failed to open link: {e}");
            LinkOutcome::Failed(e.to_string())
        }
    }
}

fn is_web_url(url: &str) -> bool {
    reqwest::Url::parse(url)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

/// Hands the URL to the platform's default handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemOpener;

#[async_trait]
impl LinkOpener for SystemOpener {
    async fn can_open(&self, url: &str) -> bool {
        is_web_url(url)
    }

    async fn open(&self, url: &str) -> Result<(), AppError> {
        let mut cmd = if cfg!(target_os = "macos") {
            tokio::process::Command::new("open")
        } else if cfg!(target_os = "windows") {
            let mut c = tokio::process::Command::new("cmd");
            c.args(["/C", "start", ""]);
            c
        } else {
            tokio::process::Command::new("xdg-open")
        };

        let status = cmd
            .arg(url)
            .status()
            .await
            .map_err(|e| AppError::Link(format!("Failed to launch opener: {e}")))?;

        if !status.success() {
            return Err(AppError::Link(format!("Opener exited with {status}")));
        }
        Ok(())
    }
}

/// Prints the URL instead of launching anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrintOpener;

#[async_trait]
impl LinkOpener for PrintOpener {
    async fn can_open(&self, url: &str) -> bool {
        is_web_url(url)
    }

    async fn open(&self, url: &str) -> Result<(), AppError> {
        println!("Open: {url}");
        Ok(())
    }
}
