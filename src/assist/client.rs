use thiserror::Error;

/// One completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    /// JSON schema the response must follow, when structured output is wanted
    pub response_schema: Option<serde_json::Value>,
}

/// Text-generation backend
pub trait CompletionService {
    fn generate(&self, request: &CompletionRequest) -> Result<String, AssistError>;
}

impl<S: CompletionService + ?Sized> CompletionService for &S {
    fn generate(&self, request: &CompletionRequest) -> Result<String, AssistError> {
        (**self).generate(request)
    }
}

/// Assist errors
#[derive(Debug, Error)]
pub enum AssistError {
    #[error("missing API key: environment variable {0} is not set")]
    MissingCredentials(String),
    #[error("invalid API key: environment variable {0} is set but cannot be sent as a header")]
    InvalidCredentials(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("response error: {0}")]
    Response(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl AssistError {
    /// Message shown in the assist panel
    pub fn user_message(&self) -> String {
        match self {
            AssistError::MissingCredentials(var) => format!(
                "The AI assistant is not configured. Set {} and try again.",
                var
            ),
            AssistError::InvalidCredentials(var) => format!(
                "The AI assistant key in {} is not valid. Check its value and try again.",
                var
            ),
            AssistError::Http(_) | AssistError::Response(_) => {
                "Could not get an answer from the AI assistant. Please try again later.".to_string()
            }
            AssistError::Malformed(_) => {
                "The AI assistant returned a response that could not be read.".to_string()
            }
        }
    }
}

/// Fixed-response service for tests and dry runs
pub struct MockCompletionService {
    pub response: Result<String, String>,
}

impl MockCompletionService {
    pub fn replying(text: &str) -> Self {
        Self { response: Ok(text.to_string()) }
    }

    pub fn failing(message: &str) -> Self {
        Self { response: Err(message.to_string()) }
    }
}

impl CompletionService for MockCompletionService {
    fn generate(&self, _request: &CompletionRequest) -> Result<String, AssistError> {
        self.response.clone().map_err(AssistError::Http)
    }
}
