//! Shared validation helpers.

/// Push an error if `value` is outside `[min, max]`.
pub(crate) fn validate_range(errors: &mut Vec<String>, name: &str, value: u32, min: u32, max: u32) {
    if value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}

/// Push an error unless `url` starts with one of `schemes` followed by `://`
/// and has a non-empty host part.
pub(crate) fn validate_url(errors: &mut Vec<String>, name: &str, url: &str, schemes: &[&str]) {
    let ok = schemes.iter().any(|scheme| {
        url.strip_prefix(scheme)
            .and_then(|rest| rest.strip_prefix("://"))
            .is_some_and(|host| !host.is_empty())
    });
    if !ok {
        let expected = schemes.join(" or ");
        errors.push(format!("{name} = \"{url}\" must be a {expected} URL"));
    }
}
