//! # Poise Coach Library
//!
//! Produces interview feedback from a photo and a voice recording using
//! hosted AI models.
//!
//! ## Modules
//!
//! - `gateway`: Inference model traits and the Cloudflare Workers AI client
//! - `feedback`: Parsing of free-text model output into suggestions
//! - `prompts`: Model instructions and fixed fallback texts
//! - `orchestrator`: The analysis flow (vision, transcription, completion, store)
//!
//! ## Example
//!
//! ```
//! use poise_coach::feedback::parse_suggestions;
//!
//! let suggestions = parse_suggestions("- Sit up straight.\n- Look at the camera.");
//! assert_eq!(suggestions.len(), 2);
//! ```

pub mod feedback;
pub mod gateway;
pub mod orchestrator;
pub mod prompts;
