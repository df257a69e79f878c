//! Note command implementations

use anyhow::Result;
use mealheiro_core::models::{NewNote, Note};
use mealheiro_core::Database;

use super::{ensure_owner, truncate};

fn print_notes(title: &str, notes: &[Note]) {
    println!();
    println!("📝 {}", title);
    println!("   ─────────────────────────────────────────────────────────────");

    for note in notes {
        let when = note.updated_at.unwrap_or(note.created_at);
        let tags = note.tag_list();
        let tags = if tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", tags.join(", "))
        };
        println!(
            "   [{}] {} │ {}{}",
            note.id,
            when.format("%Y-%m-%d"),
            truncate(&note.title, 40),
            tags
        );
        if !note.content.is_empty() {
            println!("        {}", truncate(note.content.lines().next().unwrap_or(""), 60));
        }
    }
}

pub fn cmd_notes_add(db: &Database, user_id: i64, note: NewNote) -> Result<i64> {
    let id = db.add_note(user_id, &note)?;
    println!("✅ Note saved (ID: {}): {}", id, truncate(note.title.trim(), 40));
    Ok(id)
}

pub fn cmd_notes_list(db: &Database, user_id: i64, tag: Option<&str>) -> Result<()> {
    let notes = match tag {
        Some(tag) => db.notes_with_tag(user_id, tag)?,
        None => db.list_notes(user_id)?,
    };

    if notes.is_empty() {
        match tag {
            Some(tag) => println!("No notes tagged '{}'.", tag),
            None => {
                println!("No notes yet. Write one with:");
                println!("  mealheiro notes add \"Orçamento\" -c \"Rever seguros\" -t casa");
            }
        }
        return Ok(());
    }

    let title = match tag {
        Some(tag) => format!("Notes tagged '{}'", tag),
        None => "Notes".to_string(),
    };
    print_notes(&title, &notes);
    Ok(())
}

pub fn cmd_notes_search(db: &Database, user_id: i64, text: &str) -> Result<()> {
    let notes = db.search_notes(user_id, text)?;

    if notes.is_empty() {
        println!("No notes match '{}'.", text);
        return Ok(());
    }

    print_notes(&format!("Notes matching '{}'", text), &notes);
    Ok(())
}

pub fn cmd_notes_delete(db: &Database, user_id: i64, id: i64) -> Result<()> {
    let note = db.get_note(id)?;
    ensure_owner("Note", id, note.as_ref().map(|n| n.user_id), user_id)?;

    db.delete_note(id)?;
    println!("✅ Deleted note {}", id);
    Ok(())
}
