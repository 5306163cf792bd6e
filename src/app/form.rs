//! Text forms - login, signup and prompt entry

/// A single-line editable text field with a byte-offset cursor
#[derive(Clone, Debug)]
pub struct TextField {
    pub label: &'static str,
    pub value: String,
    pub cursor: usize,
    /// Render as asterisks (passwords)
    pub masked: bool,
}

impl TextField {
    pub fn new(label: &'static str) -> Self {
        TextField {
            label,
            value: String::new(),
            cursor: 0,
            masked: false,
        }
    }

    pub fn masked(label: &'static str) -> Self {
        TextField {
            masked: true,
            ..TextField::new(label)
        }
    }

    pub fn display(&self) -> String {
        if self.masked {
            "*".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }

    /// Cursor position in characters, for placing the terminal cursor
    pub fn cursor_column(&self) -> usize {
        self.value[..self.cursor].chars().count()
    }

    pub fn insert(&mut self, c: char) {
        if self.cursor <= self.value.len() {
            self.value.insert(self.cursor, c);
            self.cursor += c.len_utf8();
        }
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            let prev = self.value[..self.cursor]
                .char_indices()
                .last()
                .map(|(i, _)| i)
                .unwrap_or(0);
            self.value.remove(prev);
            self.cursor = prev;
        }
    }

    pub fn left(&mut self) {
        if self.cursor > 0 {
            self.cursor = self.value[..self.cursor]
                .char_indices()
                .last()
                .map(|(i, _)| i)
                .unwrap_or(0);
        }
    }

    pub fn right(&mut self) {
        if self.cursor < self.value.len() {
            self.cursor = self.value[self.cursor..]
                .char_indices()
                .nth(1)
                .map(|(i, _)| self.cursor + i)
                .unwrap_or(self.value.len());
        }
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }
}

/// An ordered set of fields with one focused
#[derive(Clone, Debug)]
pub struct Form {
    pub fields: Vec<TextField>,
    pub focus: usize,
}

impl Form {
    pub const LOGIN_IDENTIFIER: usize = 0;
    pub const LOGIN_PASSWORD: usize = 1;

    pub const SIGNUP_USERNAME: usize = 0;
    pub const SIGNUP_EMAIL: usize = 1;
    pub const SIGNUP_PASSWORD: usize = 2;
    pub const SIGNUP_CONFIRM: usize = 3;

    pub const PROMPT_TEXT: usize = 0;
    pub const PROMPT_NEGATIVE: usize = 1;
    pub const PROMPT_IMAGE: usize = 2;

    pub fn login() -> Self {
        Form {
            fields: vec![
                TextField::new("Email or Username"),
                TextField::masked("Password"),
            ],
            focus: 0,
        }
    }

    pub fn signup() -> Self {
        Form {
            fields: vec![
                TextField::new("Username"),
                TextField::new("Email"),
                TextField::masked("Password"),
                TextField::masked("Confirm Password"),
            ],
            focus: 0,
        }
    }

    pub fn prompt() -> Self {
        Form {
            fields: vec![
                TextField::new("Describe your image..."),
                TextField::new("What to avoid? (negative prompt)"),
                TextField::new("Input image path (optional)"),
            ],
            focus: 0,
        }
    }

    pub fn value(&self, index: usize) -> &str {
        self.fields
            .get(index)
            .map(|f| f.value.as_str())
            .unwrap_or("")
    }

    pub fn focused_mut(&mut self) -> &mut TextField {
        &mut self.fields[self.focus]
    }

    pub fn next_field(&mut self) {
        self.focus = (self.focus + 1) % self.fields.len();
    }

    pub fn prev_field(&mut self) {
        self.focus = self.focus.checked_sub(1).unwrap_or(self.fields.len() - 1);
    }

    pub fn clear(&mut self) {
        for field in &mut self.fields {
            field.clear();
        }
        self.focus = 0;
    }

    /// Clear only the masked fields, keeping identifiers for a retry
    pub fn clear_secrets(&mut self) {
        for field in self.fields.iter_mut().filter(|f| f.masked) {
            field.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_with_multibyte_chars() {
        let mut field = TextField::new("Prompt");
        for c in "café".chars() {
            field.insert(c);
        }
        assert_eq!(field.value, "café");
        assert_eq!(field.cursor_column(), 4);

        field.left();
        field.insert('x');
        assert_eq!(field.value, "cafxé");

        field.right();
        field.backspace();
        assert_eq!(field.value, "cafx");
        assert_eq!(field.cursor, 4);
    }

    #[test]
    fn test_masked_display() {
        let mut field = TextField::masked("Password");
        field.insert('p');
        field.insert('w');
        assert_eq!(field.display(), "**");
    }

    #[test]
    fn test_focus_wraps_and_secrets_clear() {
        let mut form = Form::login();
        form.prev_field();
        assert_eq!(form.focus, Form::LOGIN_PASSWORD);
        form.next_field();
        assert_eq!(form.focus, Form::LOGIN_IDENTIFIER);

        form.focused_mut().insert('a');
        form.next_field();
        form.focused_mut().insert('b');
        form.clear_secrets();
        assert_eq!(form.value(Form::LOGIN_IDENTIFIER), "a");
        assert_eq!(form.value(Form::LOGIN_PASSWORD), "");
    }
}
