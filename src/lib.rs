//! # Smart Photo
//!
//! A photo-editing engine. An uploaded image is decoded once, then every
//! change to its adjustments or selected effect is compiled into a single
//! declarative filter expression and redrawn onto a render surface. Saves go
//! to an in-memory gallery; downloads are encoded on demand. A small static
//! server delivers a built front end with single-page fallback.
//!
//! # Architecture: Edit Flow
//!
//! ```text
//! upload ─▶ validate ─▶ decode ─▶ render ◀─ compose ◀─ adjust / select effect
//!                                   │
//!                                   └─▶ save ─▶ gallery      download ─▶ file
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`filter`] | Adjustment state, effect presets, the filter expression grammar, and the compiler from editing mode to expression |
//! | [`imaging`] | Codec trait and `image`-crate codec, colour primitives, render surface and pipeline |
//! | [`session`] | Edit session controller: decode tickets, editing operations, render policy, save/cancel/download |
//! | [`upload`] | Boundary validation of uploaded bytes (MIME type, size, sniffed format) |
//! | [`gallery`] | Newest-first snapshot collection and the visibility tracker for deferred loading |
//! | [`server`] | Static asset server with `index.html` fallback |
//! | [`config`] | `config.toml` + environment layering and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Notes
//!
//! ## Filter Expressions as Data
//!
//! Expressions are typed lists of functions (`brightness(120%) sepia(100%)`)
//! that print to and parse from the CSS `filter` grammar. The compiler never
//! clamps; clamping happens once, when a [`filter::FilterPatch`] is merged.
//!
//! ## Intensity Is a Blend
//!
//! An effect at intensity `t` composes to its template followed by
//! `opacity(t%)`. The pipeline treats that trailing opacity as the weight of
//! the filtered layer over the untouched source, so intensity 0 renders the
//! source exactly.
//!
//! ## One Render Per Change
//!
//! The controller redraws synchronously after every change, or, with the
//! coalesced render policy, once per flush. Decoding is the only step that
//! may run on another thread; stale decodes are dropped by ticket.

pub mod config;
pub mod filter;
pub mod gallery;
pub mod imaging;
pub mod output;
pub mod server;
pub mod session;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_helpers;
