//! Value declarations and the registries that own them.

pub mod declaration;
pub mod registry;

pub use declaration::{Datatype, Scope, ValueDeclaration, STORAGE_DEFAULT};
pub use registry::{store_key, RegistryStore, ValueRegistry};

/// Generate a new value ID.
pub fn generate_value_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Whether `id` has the shape of a value ID: a UUID in its hyphenated
/// 36 character form.
pub fn is_valid_value_id(id: &str) -> bool {
    id.len() == 36 && uuid::Uuid::parse_str(id).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_valid() {
        let id = generate_value_id();
        assert!(is_valid_value_id(&id));
        assert_ne!(id, generate_value_id());
    }

    #[test]
    fn test_id_validation() {
        assert!(is_valid_value_id("c956bfe0-a591-11ed-b2b6-471886667bd8"));
        assert!(!is_valid_value_id("NOT~AN~UUID"));
        assert!(!is_valid_value_id(""));
    }

    #[test]
    fn test_id_validation_requires_hyphenated_form() {
        assert!(!is_valid_value_id("c956bfe0a59111edb2b6471886667bd8"));
        assert!(!is_valid_value_id("{c956bfe0-a591-11ed-b2b6-471886667bd8}"));
        assert!(!is_valid_value_id("urn:uuid:c956bfe0-a591-11ed-b2b6-471886667bd8"));
    }
}
