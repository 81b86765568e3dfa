#[cfg(feature = "dialect-openai")]
pub mod openai;

#[cfg(feature = "dialect-ollama")]
pub mod ollama;
