// Bilingual HUD text. Spanish is the default locale.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Locale {
    Es,
    En,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::Es, Locale::En];

    pub fn code(&self) -> &'static str {
        match self {
            Locale::Es => "es",
            Locale::En => "en",
        }
    }

    /// Name of the language in that language, for the selector.
    pub fn native_name(&self) -> &'static str {
        match self {
            Locale::Es => "Español",
            Locale::En => "English",
        }
    }

    /// Accepts `es`, `en` and region tags such as `en-US`.
    pub fn from_code(code: &str) -> Option<Self> {
        let primary = code.trim().split(['-', '_']).next().unwrap_or("");
        match primary.to_ascii_lowercase().as_str() {
            "es" => Some(Locale::Es),
            "en" => Some(Locale::En),
            _ => None,
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Locale::Es => Locale::En,
            Locale::En => Locale::Es,
        }
    }

    pub fn strings(&self) -> &'static Strings {
        match self {
            Locale::Es => &ES,
            Locale::En => &EN,
        }
    }
}

pub struct Strings {
    pub title: &'static str,
    pub click_to_start: &'static str,
    pub controls_flight: &'static str,
    pub controls_grounded: &'static str,
    pub time: &'static str,
    pub collected: &'static str,
    pub turbo_active: &'static str,
    pub turbo_cooldown: &'static str,
    pub picked_up: &'static str,
    pub complete: &'static str,
    pub finish_time: &'static str,
    pub best_time: &'static str,
    pub new_record: &'static str,
    pub restart_hint: &'static str,
    pub language: &'static str,
}

static ES: Strings = Strings {
    title: "Dimensión N+1",
    click_to_start: "Haz clic para comenzar",
    controls_flight: "WASD mover · Espacio/E subir · Q/Ctrl bajar · Shift correr (doble = turbo) · Clic derecho zoom",
    controls_grounded: "WASD mover · Espacio saltar · Shift correr (doble = turbo) · Clic derecho zoom",
    time: "Tiempo",
    collected: "Recogidos",
    turbo_active: "¡TURBO!",
    turbo_cooldown: "Turbo recargando…",
    picked_up: "¡Recogido!",
    complete: "¡Dimensión completada!",
    finish_time: "Tu tiempo",
    best_time: "Mejor tiempo",
    new_record: "¡Nuevo récord!",
    restart_hint: "Pulsa R para jugar de nuevo",
    language: "Idioma",
};

static EN: Strings = Strings {
    title: "Dimension N+1",
    click_to_start: "Click to start",
    controls_flight: "WASD move · Space/E up · Q/Ctrl down · Shift run (double = turbo) · Right click zoom",
    controls_grounded: "WASD move · Space jump · Shift run (double = turbo) · Right click zoom",
    time: "Time",
    collected: "Collected",
    turbo_active: "TURBO!",
    turbo_cooldown: "Turbo recharging…",
    picked_up: "Picked up!",
    complete: "Dimension complete!",
    finish_time: "Your time",
    best_time: "Best time",
    new_record: "New record!",
    restart_hint: "Press R to play again",
    language: "Language",
};

/// `12.34 s`, or the `--` placeholder when there is no value.
pub fn format_seconds(seconds: Option<f64>) -> String {
    match seconds {
        Some(s) => format!("{s:.2} s"),
        None => "--".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_codes_round_trip_with_regions() {
        assert_eq!(Locale::from_code("en-US"), Some(Locale::En));
        assert_eq!(Locale::from_code("ES"), Some(Locale::Es));
        assert_eq!(Locale::from_code("fr"), None);
        for locale in Locale::ALL {
            assert_eq!(Locale::from_code(locale.code()), Some(locale));
        }
    }

    #[test]
    fn next_cycles_both_locales() {
        assert_eq!(Locale::Es.next(), Locale::En);
        assert_eq!(Locale::Es.next().next(), Locale::Es);
    }

    #[test]
    fn locales_differ() {
        assert_ne!(Locale::Es.strings().click_to_start, Locale::En.strings().click_to_start);
    }

    #[test]
    fn seconds_format() {
        assert_eq!(format_seconds(Some(7.5)), "7.50 s");
        assert_eq!(format_seconds(Some(61.25)), "61.25 s");
        assert_eq!(format_seconds(None), "--");
    }
}
