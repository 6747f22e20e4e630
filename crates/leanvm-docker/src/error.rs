#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("`{program}` could not be started — is it installed and on PATH?")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
}
