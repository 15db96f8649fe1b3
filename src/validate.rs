//! Form validation rules. All checks are pure and only ever answer
//! pass/fail; the handlers decide which flash message a failure maps to.
//!
//! Lengths count characters, not bytes, so multi-byte titles are not
//! penalized.

pub fn movie_input(title: &str, year: &str) -> bool {
    // The year is deliberately a plain length check, not a numeric parse.
    !title.is_empty() && title.chars().count() <= 60 && year.chars().count() == 4
}

pub fn login_input(username: &str, password: &str) -> bool {
    !username.is_empty() && !password.is_empty()
}

pub fn name_input(name: &str) -> bool {
    !name.is_empty() && name.chars().count() <= 20
}
