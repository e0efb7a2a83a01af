use regex::Regex;

pub const SPECIALTIES: [&str; 16] = [
    "General Physician",
    "Cardiologist",
    "Dentist",
    "Orthopedic",
    "Dermatologist",
    "Neurologist",
    "Pediatrician",
    "Gynecologist",
    "ENT",
    "Psychiatrist",
    "Oncologist",
    "Urologist",
    "Nephrologist",
    "Gastroenterologist",
    "Pulmonologist",
    "Ophthalmologist",
];

const SYMPTOM_TABLE: [(&[&str], &str); 3] = [
    (&["fever", "cold", "headache", "stomach pain"], "General Physician"),
    (&["skin", "rash"], "Dermatologist"),
    (&["tooth", "teeth"], "Dentist"),
];

pub const MORE_DETAILS_PLEASE: &str = "Please provide more details about your symptoms.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatIntent {
    DoctorLookup {
        city: Option<String>,
        specialty: Option<&'static str>,
    },
    SymptomAdvice {
        specialty: &'static str,
    },
    Fallback,
}

/// Keyword matcher for chat messages. Substring based, so "ENT" also fires
/// on words like "parent" and the city phrase can catch "in" inside a word.
pub struct IntentClassifier {
    city_pattern: Option<Regex>,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier {
    pub fn new() -> Self {
        Self {
            city_pattern: Regex::new(r"(?i)in ([a-zA-Z ]+)").ok(),
        }
    }

    pub fn classify(&self, message: &str) -> ChatIntent {
        let city = self.city(message);
        let specialty = specialty_in(message);

        if message.to_lowercase().contains("doctor") || specialty.is_some() || city.is_some() {
            return ChatIntent::DoctorLookup { city, specialty };
        }

        match suggest_specialty(message) {
            Some(specialty) => ChatIntent::SymptomAdvice { specialty },
            None => ChatIntent::Fallback,
        }
    }

    pub fn city(&self, message: &str) -> Option<String> {
        self.city_pattern
            .as_ref()?
            .captures(message)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|city| !city.is_empty())
    }
}

pub fn specialty_in(message: &str) -> Option<&'static str> {
    let lowered = message.to_lowercase();
    SPECIALTIES
        .iter()
        .copied()
        .find(|specialty| lowered.contains(&specialty.to_lowercase()))
}

/// Symptom keywords to the specialty worth consulting, first table row wins.
pub fn suggest_specialty(symptoms: &str) -> Option<&'static str> {
    let lowered = symptoms.to_lowercase();
    SYMPTOM_TABLE
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|keyword| lowered.contains(keyword)))
        .map(|(_, specialty)| *specialty)
}

pub fn symptom_advice(symptoms: &str) -> String {
    match suggest_specialty(symptoms) {
        Some(specialty) => format!("You may need to consult a {}.", specialty),
        None => MORE_DETAILS_PLEASE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_and_specialty_are_extracted() {
        let classifier = IntentClassifier::new();

        assert_eq!(
            classifier.classify("Find ENT doctors in Siwan"),
            ChatIntent::DoctorLookup {
                city: Some("Siwan".to_string()),
                specialty: Some("ENT"),
            }
        );
    }

    #[test]
    fn test_city_stops_at_punctuation() {
        let classifier = IntentClassifier::new();

        assert_eq!(classifier.city("Any cardiologist in New Delhi?"), Some("New Delhi".to_string()));
        assert_eq!(classifier.city("I have a fever"), None);
    }

    #[test]
    fn test_doctor_keyword_alone_triggers_lookup() {
        let classifier = IntentClassifier::new();

        assert_eq!(
            classifier.classify("I need a Doctor"),
            ChatIntent::DoctorLookup { city: None, specialty: None }
        );
    }

    #[test]
    fn test_first_listed_specialty_wins() {
        assert_eq!(specialty_in("dermatologist or dentist?"), Some("Dentist"));
    }

    #[test]
    fn test_symptoms_map_to_specialties() {
        let classifier = IntentClassifier::new();

        assert_eq!(
            classifier.classify("I have a high FEVER"),
            ChatIntent::SymptomAdvice { specialty: "General Physician" }
        );
        assert_eq!(suggest_specialty("itchy rash"), Some("Dermatologist"));
        assert_eq!(suggest_specialty("my teeth hurt"), Some("Dentist"));
        assert_eq!(suggest_specialty("feeling tired"), None);
    }

    #[test]
    fn test_symptom_advice_text() {
        assert_eq!(symptom_advice("bad headache"), "You may need to consult a General Physician.");
        assert_eq!(symptom_advice("tired"), MORE_DETAILS_PLEASE);
    }

    #[test]
    fn test_unmatched_message_falls_back() {
        let classifier = IntentClassifier::new();

        assert_eq!(classifier.classify("hello there"), ChatIntent::Fallback);
    }
}
