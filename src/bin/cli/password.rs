//! Password handling for CLI operations.

use rpassword::prompt_password;
use varc::Password;

/// Gets a password from the provided option or prompts the user.
pub fn get_password(provided: Option<String>) -> Option<Password> {
    if let Some(pwd) = provided {
        return Some(Password::new(pwd));
    }

    match prompt_password("Enter password: ") {
        Ok(pwd) if !pwd.is_empty() => Some(Password::new(pwd)),
        _ => None,
    }
}

/// Prompts for a password with confirmation (used when creating encrypted
/// archives or locking).
pub fn confirm_password(provided: Option<String>) -> Option<Password> {
    if let Some(pwd) = provided {
        return Some(Password::new(pwd));
    }

    let first = match prompt_password("Enter password: ") {
        Ok(pwd) => pwd,
        Err(_) => return None,
    };
    if first.is_empty() {
        eprintln!("Password cannot be empty");
        return None;
    }

    let second = match prompt_password("Confirm password: ") {
        Ok(pwd) => pwd,
        Err(_) => return None,
    };

    if first == second {
        Some(Password::new(first))
    } else {
        eprintln!("Passwords do not match");
        None
    }
}
