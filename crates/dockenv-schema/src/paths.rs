/// The current user's home directory, from `HOME`.
pub fn home_dir() -> Option<String> {
    std::env::var("HOME").ok().filter(|h| !h.is_empty())
}

/// Expand `$HOME`, `${HOME}` and a leading `~` against the current user's home.
pub fn expand_home(input: &str) -> String {
    expand_home_with(input, home_dir().as_deref())
}

/// Same as [`expand_home`] with an explicit home directory.
///
/// Without a home directory the input is returned unchanged.
pub fn expand_home_with(input: &str, home: Option<&str>) -> String {
    let Some(home) = home else {
        return input.to_owned();
    };
    let home = home.trim_end_matches('/');

    let replaced = replace_home_tokens(input, home);
    match replaced.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => format!("{home}{rest}"),
        _ => replaced,
    }
}

fn replace_home_tokens(input: &str, home: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        if let Some(tail) = after.strip_prefix("{HOME}") {
            out.push_str(home);
            rest = tail;
            continue;
        }
        if let Some(tail) = after.strip_prefix("HOME") {
            // `$HOMEDIR` names another variable
            if !tail.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_') {
                out.push_str(home);
                rest = tail;
                continue;
            }
        }
        out.push('$');
        rest = after;
    }
    out.push_str(rest);
    out
}
