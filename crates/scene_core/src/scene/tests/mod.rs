//! Cross-module scene tests

mod scene_integration;
