pub mod locks;
pub mod order_service;
pub mod review_service;

/// One `@` with non-empty text on both sides. Nothing stricter.
pub(crate) fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::looks_like_email;

    #[test]
    fn email_shape_check() {
        assert!(looks_like_email("maya@example.com"));
        assert!(looks_like_email("a@b"));
        assert!(!looks_like_email("plainaddress"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("maya@"));
        assert!(!looks_like_email("maya@exa@mple.com"));
    }
}
