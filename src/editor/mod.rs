// Interactive configuration editor
//
// Menus are plain tables of prompts; the session below walks them over any
// line-oriented input, so it runs the same against a terminal or a test buffer.

pub mod menus;
pub mod prompt;

pub use menus::{prompt_for, Menu, MENUS};
pub use prompt::{Constraint, Pattern, Prompt, ValidationError};

use crate::record::ConfigModel;
use std::io::{self, BufRead, Write};

/// Walk the menus, applying edits to `model` until the user quits.
///
/// Returns the number of fields changed. End of input behaves like quitting.
pub fn run<R: BufRead, W: Write>(model: &mut ConfigModel, input: &mut R, out: &mut W) -> io::Result<usize> {
    let mut changes = 0;

    loop {
        writeln!(out)?;
        for (i, menu) in MENUS.iter().enumerate() {
            writeln!(out, "{:>2} - {}", i + 1, menu.title)?;
        }
        write!(out, "Menu (q to finish): ")?;
        out.flush()?;

        let Some(choice) = read_line(input)? else {
            return Ok(changes);
        };
        if choice.is_empty() || choice.eq_ignore_ascii_case("q") {
            return Ok(changes);
        }

        match choice.parse::<usize>().ok().and_then(|n| n.checked_sub(1)).and_then(|i| MENUS.get(i)) {
            Some(menu) => {
                if !edit_menu(menu, model, input, out, &mut changes)? {
                    return Ok(changes);
                }
            }
            None => writeln!(out, "No menu {:?}", choice)?,
        }
    }
}

/// One submenu. Returns false when input ran out.
fn edit_menu<R: BufRead, W: Write>(
    menu: &Menu,
    model: &mut ConfigModel,
    input: &mut R,
    out: &mut W,
    changes: &mut usize,
) -> io::Result<bool> {
    loop {
        writeln!(out)?;
        writeln!(out, "[{}]", menu.title)?;
        for line in menu.render(model) {
            writeln!(out, "{}", line)?;
        }
        write!(out, "Item (empty to go back): ")?;
        out.flush()?;

        let Some(choice) = read_line(input)? else {
            return Ok(false);
        };
        if choice.is_empty() {
            return Ok(true);
        }

        let Some(prompt) = choice.parse().ok().and_then(|n| menu.item(n)) else {
            writeln!(out, "No item {:?}", choice)?;
            continue;
        };

        write!(out, "{} [{}] ({}): ", prompt.label, prompt.display(model), prompt.hint())?;
        out.flush()?;
        let Some(value) = read_line(input)? else {
            return Ok(false);
        };

        match prompt.apply(model, &value) {
            Ok(_) => {
                tracing::debug!("{} set to {}", prompt.field, prompt.display(model));
                *changes += 1;
            }
            Err(e) => writeln!(out, "{}", e)?,
        }
    }
}

fn read_line<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}
