// Skill extraction pipeline: fetch the CV, pull its text, scan it.
// Each step is usable on its own; `handlers` wires them to the HTTP surface.

pub mod fetcher;
pub mod handlers;
pub mod pdf_text;
pub mod scanner;
