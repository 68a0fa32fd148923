// SPDX-License-Identifier: MIT

//! Small shared helpers.

use uuid::Uuid;

/// Normalize a user id to 32-char lowercase hex when it is a textual UUID
/// in any form (hyphenated, braced, URN). Ids that are not UUIDs pass
/// through unchanged, so external collaborators can address users
/// consistently regardless of which form minted the id.
pub fn normalize_user_id(user_id: &str) -> String {
    match Uuid::parse_str(user_id) {
        Ok(uuid) => uuid.simple().to_string(),
        Err(_) => user_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hyphenated_uuid_normalized() {
        assert_eq!(
            normalize_user_id("0d4358bc-3afd-4f9b-9a27-8fa716a9dbd4"),
            "0d4358bc3afd4f9b9a278fa716a9dbd4"
        );
    }

    #[test]
    fn test_simple_uuid_unchanged() {
        assert_eq!(
            normalize_user_id("0d4358bc3afd4f9b9a278fa716a9dbd4"),
            "0d4358bc3afd4f9b9a278fa716a9dbd4"
        );
    }

    #[test]
    fn test_non_uuid_passes_through() {
        assert_eq!(normalize_user_id("not-a-uuid"), "not-a-uuid");
    }
}
