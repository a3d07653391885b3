// accounts/src/validation/email.rs

//! The accepted email-address grammar.
//!
//! `local@domain`, split at the last `@`. The local part is a run of
//! dot-separated words where a word may mix atext and quoted strings
//! (`"Joe.\\"Blow` is one word). The domain is at least two labels of ASCII
//! alphanumerics and hyphens. The whole address is at most 254 bytes, which
//! also keeps it inside the `VARCHAR(255)` email columns.

/// Longest forward path allowed by RFC 5321, minus the angle brackets.
pub const MAX_ADDRESS_LEN: usize = 254;
const MAX_LOCAL_LEN: usize = 64;
const MAX_DOMAIN_LEN: usize = 255;
const MAX_LABEL_LEN: usize = 63;

/// Returns `true` when `value` is an address the account model accepts.
pub fn is_valid_email(value: &str) -> bool {
  if value.len() > MAX_ADDRESS_LEN {
    return false;
  }
  match value.rsplit_once('@') {
    Some((local, domain)) => is_valid_local_part(local) && is_valid_domain(domain),
    None => false,
  }
}

fn is_valid_local_part(local: &str) -> bool {
  if local.is_empty() || local.len() > MAX_LOCAL_LEN {
    return false;
  }

  let mut chars = local.chars();
  // Number of atoms/quoted strings seen in the current dot-separated word.
  let mut word_len = 0usize;
  while let Some(ch) = chars.next() {
    match ch {
      '.' => {
        if word_len == 0 {
          return false;
        }
        word_len = 0;
      }
      '"' => {
        if !consume_quoted_string(&mut chars) {
          return false;
        }
        word_len += 1;
      }
      c if is_atext(c) => word_len += 1,
      _ => return false,
    }
  }
  word_len > 0
}

/// Consumes up to and including the closing quote. The opening quote is already taken.
fn consume_quoted_string(chars: &mut impl Iterator<Item = char>) -> bool {
  let mut escaped = false;
  for ch in chars.by_ref() {
    if escaped {
      if !ch.is_ascii() {
        return false;
      }
      escaped = false;
    } else if ch == '\\' {
      escaped = true;
    } else if ch == '"' {
      return true;
    } else if !is_qtext(ch) {
      return false;
    }
  }
  // unterminated
  false
}

fn is_atext(ch: char) -> bool {
  ch.is_ascii_alphanumeric() || "!#$%&'*+-/=?^_`{|}~".contains(ch)
}

fn is_qtext(ch: char) -> bool {
  ch == ' ' || ch == '\t' || (('!'..='~').contains(&ch) && ch != '"' && ch != '\\')
}

fn is_valid_domain(domain: &str) -> bool {
  if domain.is_empty() || domain.len() > MAX_DOMAIN_LEN {
    return false;
  }

  let labels: Vec<&str> = domain.split('.').collect();
  labels.len() >= 2 && labels.iter().all(|label| is_valid_label(label))
}

fn is_valid_label(label: &str) -> bool {
  !label.is_empty()
    && label.len() <= MAX_LABEL_LEN
    && !label.starts_with('-')
    && !label.ends_with('-')
    && label.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-')
}
