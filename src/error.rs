pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("I/O Error")]
    Io(#[from] std::io::Error),
    #[error("Error Parsing Config")]
    Config(#[from] serde_json::Error),
    #[error("Error Parsing Linkerscript: {0}")]
    Linker(String),
    #[error("Failed to invoke `{command}`")]
    Tool {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` exited with {status}")]
    ToolStatus {
        command: String,
        status: std::process::ExitStatus,
    },
    #[error("Unexpected size output: {0}")]
    Output(String),
}
