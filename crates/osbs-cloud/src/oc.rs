#[derive(Debug, thiserror::Error)]
pub enum OcError {
    #[error("oc CLI not found: install the OpenShift client or set cluster.oc_binary")]
    NotFound { source: std::io::Error },

    #[error("oc command failed: {args:?}\n{stderr}")]
    CommandFailed { args: Vec<String>, stderr: String },

    #[error("oc output was not valid UTF-8")]
    InvalidUtf8 { source: std::string::FromUtf8Error },
}
