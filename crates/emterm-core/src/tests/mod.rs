//! Integration tests exercising the full pipeline: input bytes through
//! the parser into grid, cursor, scrollback, and selection state.

mod terminal_integration;
