// Engines: the pieces that talk to the outside world
// llm — provider seam for the external chat-completion API
// chat — agent chat service built on top of it

pub mod chat;
pub mod llm;
