//! Entrypay integration test helpers
