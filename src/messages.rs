//! User-facing messages, French and English.

use crate::lexicon::ProjectStatus;
use crate::types::{Lang, UpdateData};

fn plural(count: usize) -> &'static str {
    if count > 1 {
        "s"
    } else {
        ""
    }
}

pub fn not_understood(lang: Lang) -> String {
    match lang {
        Lang::Fr => "Je n'ai pas compris ta demande. Peux-tu préciser ce que tu veux faire sur tes projets ?".into(),
        Lang::En => "I didn't understand your request. Could you say what you want to do with your projects?".into(),
    }
}

pub fn create_missing_name(lang: Lang) -> String {
    match lang {
        Lang::Fr => "Quel nom veux-tu donner au nouveau projet ?".into(),
        Lang::En => "What should the new project be called?".into(),
    }
}

pub fn update_without_change(lang: Lang) -> String {
    match lang {
        Lang::Fr => "Je vois une modification mais pas la nouvelle valeur. Que veux-tu changer ?".into(),
        Lang::En => "I see a change request but no new value. What do you want to change?".into(),
    }
}

pub fn reference_confirmation(count: usize, lang: Lang) -> String {
    match lang {
        Lang::Fr => format!(
            "Appliquer aux {} projet{} précédemment listé{}",
            count,
            plural(count),
            plural(count)
        ),
        Lang::En => format!(
            "Apply to the {} previously listed project{}",
            count,
            plural(count)
        ),
    }
}

pub fn missing_context(lang: Lang) -> String {
    match lang {
        Lang::Fr => "Je ne sais pas de quels projets tu parles. Peux-tu préciser (par exemple « les projets en cours ») ?".into(),
        Lang::En => "I don't know which projects you mean. Could you be more specific (for example \"the projects in progress\")?".into(),
    }
}

pub fn expired_context(lang: Lang) -> String {
    match lang {
        Lang::Fr => "La liste précédente a expiré. Peux-tu redire quels projets sont concernés ?".into(),
        Lang::En => "The previous list has expired. Could you say again which projects you mean?".into(),
    }
}

pub fn all_projects_warning(count: usize, lang: Lang) -> String {
    match lang {
        Lang::Fr => format!(
            "Aucun filtre détecté : la modification s'appliquera à TOUS les projets ({}).",
            count
        ),
        Lang::En => format!(
            "No filter detected: the change will apply to ALL projects ({}).",
            count
        ),
    }
}

pub fn all_projects_explicit(count: usize, lang: Lang) -> String {
    match lang {
        Lang::Fr => format!("La modification s'appliquera à TOUS les projets ({}).", count),
        Lang::En => format!("The change will apply to ALL projects ({}).", count),
    }
}

pub fn explicit_scope(count: usize, lang: Lang) -> String {
    match lang {
        Lang::Fr => format!("{} projet{} concerné{}", count, plural(count), plural(count)),
        Lang::En => format!("{} matching project{}", count, plural(count)),
    }
}

pub fn no_matching_projects(lang: Lang) -> String {
    match lang {
        Lang::Fr => "Aucun projet ne correspond à ces critères.".into(),
        Lang::En => "No project matches these criteria.".into(),
    }
}

pub fn list_summary(count: usize, lang: Lang) -> String {
    match lang {
        Lang::Fr => format!("{} projet{} trouvé{}", count, plural(count), plural(count)),
        Lang::En => format!("{} project{} found", count, plural(count)),
    }
}

pub fn count_summary(count: usize, lang: Lang) -> String {
    match lang {
        Lang::Fr => format!("Tu as {} projet{}.", count, plural(count)),
        Lang::En => format!("You have {} project{}.", count, plural(count)),
    }
}

pub fn create_summary(name: &str, lang: Lang) -> String {
    match lang {
        Lang::Fr => format!("Créer le projet « {} » ?", name),
        Lang::En => format!("Create the project \"{}\"?", name),
    }
}

pub fn note_confirmation(count: usize, lang: Lang) -> String {
    match lang {
        Lang::Fr => format!("Ajouter la note à {} projet{} ?", count, plural(count)),
        Lang::En => format!("Add the note to {} project{}?", count, plural(count)),
    }
}

/// One-line description of the requested change
pub fn describe_mutation(data: &UpdateData, lang: Lang) -> String {
    let mut parts = Vec::new();
    if let Some(status) = data.new_status {
        parts.push(status_change(status, lang));
    }
    if let Some(progress) = data.new_progress {
        parts.push(match lang {
            Lang::Fr => format!("avancement → {}%", progress),
            Lang::En => format!("progress → {}%", progress),
        });
    }
    match data.new_deadline {
        Some(Some(date)) => parts.push(format!("deadline → {}", date.format("%Y-%m-%d"))),
        Some(None) => parts.push(match lang {
            Lang::Fr => "suppression de la deadline".into(),
            Lang::En => "deadline removed".into(),
        }),
        None => {}
    }
    if let Some(shift) = data.push_deadline_by {
        let mut pieces = Vec::new();
        for (amount, fr, en) in [
            (shift.months, "mois", "month(s)"),
            (shift.weeks, "semaine(s)", "week(s)"),
            (shift.days, "jour(s)", "day(s)"),
        ] {
            if let Some(n) = amount {
                let unit = match lang {
                    Lang::Fr => fr,
                    Lang::En => en,
                };
                pieces.push(format!("{:+} {}", n, unit));
            }
        }
        parts.push(format!("deadline {}", pieces.join(" ")));
    }
    for (value, field) in [
        (&data.new_collab, "collab"),
        (&data.new_style, "style"),
        (&data.new_label, "label"),
        (&data.new_label_final, "label final"),
    ] {
        if let Some(v) = value {
            parts.push(format!("{} → {}", field, v));
        }
    }
    if data.new_note.is_some() {
        parts.push(match lang {
            Lang::Fr => "ajout d'une note".into(),
            Lang::En => "note added".into(),
        });
    }
    parts.join(", ")
}

fn status_change(status: ProjectStatus, lang: Lang) -> String {
    match lang {
        Lang::Fr => format!("statut → {}", status.label(lang)),
        Lang::En => format!("status → {}", status.label(lang)),
    }
}
