/// Derive the human label for an operator from its snake_case name:
/// `equal_to` → `Equal To`. Explicit labels in the catalogs override this.
pub fn pretty_label(name: &str) -> String {
    name.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::pretty_label;

    #[test]
    fn snake_case_to_title_case() {
        assert_eq!(pretty_label("equal_to"), "Equal To");
        assert_eq!(pretty_label("non_empty"), "Non Empty");
        assert_eq!(
            pretty_label("shares_at_least_one_element_with"),
            "Shares At Least One Element With"
        );
        assert_eq!(pretty_label("exists"), "Exists");
    }
}
