//! StageKit End-to-End Test Infrastructure
//!
//! Integration tests drive the real glTF decode path with small in-memory
//! GLB files built by [`fixtures::AvatarFixture`]:
//!
//! - Ingestion: rig detection, normalization, IK targets, neutral pose
//! - Chain discovery across every supported rig naming convention
//! - Scene round trip: export, load, re-ingest, restore
//! - Store lifecycle: late results, removal, disposal
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p stagekit-tests
//! ```

pub mod fixtures;
