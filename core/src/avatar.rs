// accounts/src/avatar.rs

//! Gravatar URLs and `<img>` tags for a user.
//!
//! Everything here is pure; the image itself is fetched by whoever renders the URL.

use md5::{Digest, Md5};

use crate::user::{normalize_email, User};

pub const DEFAULT_BASE_URL: &str = "https://secure.gravatar.com/avatar";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarConfig {
  /// Image endpoint without a trailing slash.
  pub base_url: String,
  /// Requested edge length in pixels; omitted from the URL when `None`.
  pub size: Option<u32>,
}

impl Default for AvatarConfig {
  fn default() -> Self {
    Self {
      base_url: DEFAULT_BASE_URL.to_string(),
      size: None,
    }
  }
}

/// `md5-hex(lowercase(email))`.
pub fn gravatar_id(email: &str) -> String {
  hex::encode(Md5::digest(normalize_email(email).as_bytes()))
}

impl AvatarConfig {
  pub fn new(base_url: impl Into<String>) -> Self {
    Self {
      base_url: base_url.into().trim_end_matches('/').to_string(),
      size: None,
    }
  }

  pub fn with_size(mut self, size: u32) -> Self {
    self.size = Some(size);
    self
  }

  pub fn url_for_email(&self, email: &str) -> String {
    let mut url = format!("{}/{}", self.base_url, gravatar_id(email));
    if let Some(size) = self.size {
      url.push_str(&format!("?s={}", size));
    }
    url
  }

  pub fn url_for(&self, user: &User) -> String {
    self.url_for_email(&user.email)
  }

  /// Renders `<img alt="…" class="gravatar" src="…" />` for `user`.
  pub fn image_tag(&self, user: &User) -> String {
    format!(
      r#"<img alt="{}" class="gravatar" src="{}" />"#,
      escape_html_attr(&user.name),
      escape_html_attr(&self.url_for(user))
    )
  }
}

fn escape_html_attr(input: &str) -> String {
  let mut out = String::with_capacity(input.len());
  for ch in input.chars() {
    match ch {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#x27;"),
      _ => out.push(ch),
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;
  use uuid::Uuid;

  fn user(name: &str, email: &str) -> User {
    let now = Utc::now();
    User {
      id: Uuid::new_v4(),
      name: name.into(),
      email: email.into(),
      email_lower: normalize_email(email),
      password_digest: String::new(),
      created_at: now,
      updated_at: now,
    }
  }

  #[test]
  fn id_is_md5_of_lowercased_email() {
    // md5("user@example.com")
    assert_eq!(gravatar_id("user@example.com"), "b58996c504c5638798eb6b511e6f49af");
    assert_eq!(gravatar_id("USER@Example.com"), gravatar_id("user@example.com"));
  }

  #[test]
  fn url_uses_base_and_optional_size() {
    let config = AvatarConfig::new("https://img.example.org/avatar/");
    let u = user("Example User", "user@example.com");
    assert_eq!(
      config.url_for(&u),
      "https://img.example.org/avatar/b58996c504c5638798eb6b511e6f49af"
    );
    assert_eq!(
      config.clone().with_size(80).url_for(&u),
      "https://img.example.org/avatar/b58996c504c5638798eb6b511e6f49af?s=80"
    );
    assert!(AvatarConfig::default().url_for(&u).starts_with(DEFAULT_BASE_URL));
  }

  #[test]
  fn image_tag_escapes_the_name() {
    let u = user(r#"<b>"Joe"</b>"#, "joe@example.com");
    let tag = AvatarConfig::default().image_tag(&u);
    assert!(tag.starts_with(r#"<img alt="&lt;b&gt;&quot;Joe&quot;&lt;/b&gt;" class="gravatar" src="https://secure.gravatar.com/avatar/"#));
    assert!(tag.ends_with(r#"" />"#));
  }
}
