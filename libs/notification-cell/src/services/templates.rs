//! French email templates for appointment lifecycle and login events.

pub struct EmailTemplate {
    pub subject: String,
    pub text: String,
}

pub fn appointment_created(
    patient_name: &str,
    doctor_name: &str,
    date: &str,
    time: &str,
) -> EmailTemplate {
    EmailTemplate {
        subject: "Confirmation de votre rendez-vous".to_string(),
        text: format!(
            "Bonjour {patient_name},\n\n\
             Votre rendez-vous avec le Dr {doctor_name} a bien été enregistré \
             pour le {date} à {time}.\n\n\
             Cordialement,\nLa clinique Bienêtre"
        ),
    }
}

pub fn appointment_updated(
    patient_name: &str,
    doctor_name: &str,
    date: &str,
    time: &str,
) -> EmailTemplate {
    EmailTemplate {
        subject: "Modification de votre rendez-vous".to_string(),
        text: format!(
            "Bonjour {patient_name},\n\n\
             Votre rendez-vous avec le Dr {doctor_name} a été modifié. \
             Il est désormais prévu le {date} à {time}.\n\n\
             Cordialement,\nLa clinique Bienêtre"
        ),
    }
}

pub fn appointment_cancelled(
    patient_name: &str,
    doctor_name: &str,
    date: &str,
    time: &str,
) -> EmailTemplate {
    EmailTemplate {
        subject: "Annulation de votre rendez-vous".to_string(),
        text: format!(
            "Bonjour {patient_name},\n\n\
             Votre rendez-vous avec le Dr {doctor_name} du {date} à {time} \
             a été annulé.\n\n\
             Cordialement,\nLa clinique Bienêtre"
        ),
    }
}

pub fn two_factor_code(code: &str) -> EmailTemplate {
    EmailTemplate {
        subject: "Votre code de vérification".to_string(),
        text: format!(
            "Bonjour,\n\n\
             Votre code de vérification est : {code}\n\
             Il expire dans 5 minutes.\n\n\
             Cordialement,\nLa clinique Bienêtre"
        ),
    }
}
