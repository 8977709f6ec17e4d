//! Scene output
//!
//! The game never touches a renderer directly. Every component appends
//! [`SceneCommand`]s to a queue the host drains once per frame. [`RenderList`]
//! is a reference consumer that mirrors the scene and packs GPU instance data.

pub mod instance;
pub mod render_list;
pub mod scene;

pub use instance::{BoxInstance, MeshVertex, colors};
pub use render_list::RenderList;
pub use scene::{EntityId, EntityKind, Material, Mesh, Renderable, SceneCommand, Transform};
