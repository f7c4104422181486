//! I/O stages around the reflow core.
//!
//! ```text
//! input ──▶ extract ──▶ cleanup ──▶ [generate ──▶ salvage] ──▶ reflow ──▶ publish
//! (path/URL)  (pdfium)   (text only)   (LLM, optional)
//! ```
//!
//! 1. [`input`]    resolve a path or URL to a local PDF
//! 2. [`extract`]  flat text or positioned fragments via pdfium (`spawn_blocking`)
//! 3. [`cleanup`]  normalise text before paragraph reflow
//! 4. [`generate`] single structuring request to an LLM
//!
//! Stages run strictly one after another; each is awaited before the next
//! starts and any error ends the conversion.

pub mod cleanup;
pub mod extract;
pub mod generate;
pub mod input;
