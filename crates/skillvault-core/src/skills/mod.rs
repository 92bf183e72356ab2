//! Skill units: discovery and `SKILL.md` validation

pub mod discovery;
pub mod frontmatter;
pub mod validator;

pub use discovery::{DiscoveredUnit, scan};
pub use frontmatter::{FrontmatterDecoder, YamlDecoder, extract_frontmatter};
pub use validator::{SkillFields, SkillValidator, ValidationResult};
