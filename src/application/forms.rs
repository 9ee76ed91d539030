//! Form validation for user-submitted content.
//!
//! Raw submissions are deserialized by the HTTP layer and validated here
//! into typed values; failures carry per-field messages so the original
//! form can be re-rendered with errors instead of an error page.

use uuid::Uuid;

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 30;
const PASSWORD_MIN: usize = 8;

/// Field-keyed validation messages, in submission order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormErrors {
    entries: Vec<FieldError>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FormErrors {
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.entries.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn for_field(&self, field: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.field == field)
            .map(|entry| entry.message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.entries.iter()
    }

    fn into_result<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

/// Raw new/edit post submission.
#[derive(Debug, Clone, Default)]
pub struct PostForm {
    pub text: String,
    /// Group id from the form's select control; empty means no group.
    pub group: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPostForm {
    pub text: String,
    pub group_id: Option<Uuid>,
}

impl PostForm {
    pub fn validate(&self) -> Result<ValidatedPostForm, FormErrors> {
        let mut errors = FormErrors::default();

        let text = self.text.trim();
        if text.is_empty() {
            errors.push("text", "Post text is required.");
        }

        let group_raw = self.group.trim();
        let group_id = if group_raw.is_empty() {
            None
        } else {
            match Uuid::parse_str(group_raw) {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.push("group", "Select a valid group.");
                    None
                }
            }
        };

        errors.into_result(ValidatedPostForm {
            text: text.to_string(),
            group_id,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommentForm {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedCommentForm {
    pub text: String,
}

impl CommentForm {
    pub fn validate(&self) -> Result<ValidatedCommentForm, FormErrors> {
        let mut errors = FormErrors::default();

        let text = self.text.trim();
        if text.is_empty() {
            errors.push("text", "Comment text is required.");
        }

        errors.into_result(ValidatedCommentForm {
            text: text.to_string(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub username: String,
    pub display_name: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSignupForm {
    pub username: String,
    pub display_name: String,
    pub password: String,
}

impl SignupForm {
    pub fn validate(&self) -> Result<ValidatedSignupForm, FormErrors> {
        let mut errors = FormErrors::default();

        let username = self.username.trim();
        if username.len() < USERNAME_MIN || username.len() > USERNAME_MAX {
            errors.push(
                "username",
                format!("Username must be {USERNAME_MIN}-{USERNAME_MAX} characters."),
            );
        } else if !username
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
        {
            errors.push(
                "username",
                "Username may contain letters, digits, `-` and `_` only.",
            );
        }

        if self.password.len() < PASSWORD_MIN {
            errors.push(
                "password",
                format!("Password must be at least {PASSWORD_MIN} characters."),
            );
        }

        let display_name = self.display_name.trim();
        let display_name = if display_name.is_empty() {
            username.to_string()
        } else {
            display_name.to_string()
        };

        errors.into_result(ValidatedSignupForm {
            username: username.to_string(),
            display_name,
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        if self.username.trim().is_empty() {
            errors.push("username", "Username is required.");
        }
        if self.password.is_empty() {
            errors.push("password", "Password is required.");
        }
        errors.into_result(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_form_requires_text() {
        let form = PostForm {
            text: "   ".to_string(),
            group: String::new(),
        };
        let errors = form.validate().expect_err("empty text rejected");
        assert!(errors.for_field("text").is_some());
    }

    #[test]
    fn post_form_accepts_optional_group() {
        let group_id = Uuid::new_v4();
        let form = PostForm {
            text: "hello".to_string(),
            group: group_id.to_string(),
        };
        let validated = form.validate().expect("valid form");
        assert_eq!(validated.group_id, Some(group_id));
        assert_eq!(validated.text, "hello");

        let without_group = PostForm {
            text: "hello".to_string(),
            group: "  ".to_string(),
        };
        assert_eq!(without_group.validate().expect("valid").group_id, None);
    }

    #[test]
    fn post_form_rejects_malformed_group() {
        let form = PostForm {
            text: "hello".to_string(),
            group: "not-a-uuid".to_string(),
        };
        let errors = form.validate().expect_err("bad group rejected");
        assert!(errors.for_field("group").is_some());
        assert!(errors.for_field("text").is_none());
    }

    #[test]
    fn comment_form_trims_and_requires_text() {
        assert!(
            CommentForm {
                text: "\n".to_string()
            }
            .validate()
            .is_err()
        );

        let validated = CommentForm {
            text: "  nice post  ".to_string(),
        }
        .validate()
        .expect("valid comment");
        assert_eq!(validated.text, "nice post");
    }

    #[test]
    fn signup_form_enforces_username_charset() {
        let form = SignupForm {
            username: "bad name!".to_string(),
            display_name: String::new(),
            password: "longenough".to_string(),
        };
        let errors = form.validate().expect_err("bad username rejected");
        assert!(errors.for_field("username").is_some());
    }

    #[test]
    fn signup_form_defaults_display_name_to_username() {
        let form = SignupForm {
            username: "casual_poster".to_string(),
            display_name: "  ".to_string(),
            password: "longenough".to_string(),
        };
        let validated = form.validate().expect("valid signup");
        assert_eq!(validated.display_name, "casual_poster");
    }

    #[test]
    fn signup_form_rejects_short_password() {
        let form = SignupForm {
            username: "casual_poster".to_string(),
            display_name: String::new(),
            password: "short".to_string(),
        };
        assert!(form.validate().is_err());
    }
}
