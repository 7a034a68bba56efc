#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("prometheus registry rejected `{name}`: {source}")]
    Prometheus {
        name: &'static str,
        #[source]
        source: prometheus::Error,
    },
    #[error("series `{series}` does not carry the labels {expected:?} of its family")]
    LabelMismatch {
        series: String,
        expected: Vec<&'static str>,
    },
    #[error("failed to encode metrics: {0}")]
    Encode(#[source] prometheus::Error),
    #[error("encoded metrics are not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, Error>;
