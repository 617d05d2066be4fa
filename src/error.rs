/// Errors raised while bringing the page up.
///
/// Component initialization failures are absorbed by `Page::load`; only the
/// terminal front-end lets `Io` reach `main`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("background renderer unavailable: {reason}")]
    RendererUnavailable { reason: String },
    #[error("radial menu disabled: missing {element}")]
    MenuElementsMissing { element: &'static str },
    #[error("invalid menu item {0:?}, expected LABEL:ANGLE")]
    InvalidItem(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
