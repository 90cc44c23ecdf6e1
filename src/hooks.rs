use std::rc::Rc;
use web_sys::HtmlInputElement;
use yew::prelude::*;

/// State and callbacks for a text input carrying a validated typed value.
///
/// The raw text is edited freely; the typed value only moves on an
/// explicit commit (change event or Enter), and a failed parse leaves the
/// previous value in place with an inline error.
#[derive(Clone)]
pub struct ValidatedInput<T: Clone + PartialEq + 'static> {
    pub text: String,
    pub value: T,
    pub error: Option<String>,
    /// `oninput` handler: mirrors keystrokes into the text state.
    pub on_text_input: Callback<InputEvent>,
    /// `onchange` handler: parses and commits the current text.
    pub on_commit: Callback<Event>,
    /// `onkeydown` handler: commits on Enter.
    pub on_keydown: Callback<KeyboardEvent>,
    /// Programmatic set: updates value and canonical text, clears errors.
    pub set_value: Callback<T>,
}

struct ParseFns<T> {
    parse: Box<dyn Fn(&str) -> Result<T, String>>,
    to_text: Box<dyn Fn(&T) -> String>,
}

#[hook]
pub fn use_validated_input<T, P, F>(
    initial: T,
    parse: P,
    to_text: F,
    on_valid: Callback<T>,
) -> ValidatedInput<T>
where
    T: Clone + PartialEq + 'static,
    P: Fn(&str) -> Result<T, String> + 'static,
    F: Fn(&T) -> String + 'static,
{
    let init_text = to_text(&initial);
    let value = use_state(move || initial);
    let text = use_state(move || init_text);
    let error = use_state(|| None::<String>);
    let parse = use_mut_ref(move || ParseFns {
        parse: Box::new(parse),
        to_text: Box::new(to_text),
    });

    let on_text_input = {
        let text = text.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            text.set(input.value());
        })
    };

    let commit = {
        let text = text.clone();
        let value = value.clone();
        let error = error.clone();
        let parse = parse.clone();
        let on_valid = on_valid.clone();
        Rc::new(move || match (parse.borrow().parse)(&text) {
            Ok(parsed) => {
                value.set(parsed.clone());
                text.set((parse.borrow().to_text)(&parsed));
                error.set(None);
                on_valid.emit(parsed);
            }
            Err(msg) => error.set(Some(msg)),
        })
    };

    let on_commit = {
        let commit = commit.clone();
        Callback::from(move |_: Event| commit())
    };

    let on_keydown = Callback::from(move |e: KeyboardEvent| {
        if e.key() == "Enter" {
            commit();
        }
    });

    let set_value = {
        let value = value.clone();
        let text = text.clone();
        let error = error.clone();
        let parse = parse.clone();
        Callback::from(move |new_val: T| {
            text.set((parse.borrow().to_text)(&new_val));
            value.set(new_val);
            error.set(None);
        })
    };

    ValidatedInput {
        text: (*text).clone(),
        value: (*value).clone(),
        error: (*error).clone(),
        on_text_input,
        on_commit,
        on_keydown,
        set_value,
    }
}
