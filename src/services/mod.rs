//! External collaborators: metadata catalog, video platform, library server.
//!
//! Each module defines the trait the core consumes plus the production
//! implementation. The core never inspects raw collaborator payloads;
//! responses are normalized into model types at this boundary.

pub mod jellyfin;
pub mod tmdb;
pub mod ytdlp;
