use crate::events::KeyCode;

/// Таблица имён клавиш, допустимых в `refresh.key`, и их evdev кодов.
/// Имена задаются в нижнем регистре, поиск регистронезависимый.
const KEY_TABLE: &[(&str, u16)] = &[
    // Функциональные клавиши (основной сценарий: F10 перезагружает моды в игре)
    ("f1", 59),
    ("f2", 60),
    ("f3", 61),
    ("f4", 62),
    ("f5", 63),
    ("f6", 64),
    ("f7", 65),
    ("f8", 66),
    ("f9", 67),
    ("f10", 68),
    ("f11", 87),
    ("f12", 88),
    // Буквенные клавиши
    ("a", 30),
    ("b", 48),
    ("c", 46),
    ("d", 32),
    ("e", 18),
    ("f", 33),
    ("g", 34),
    ("h", 35),
    ("i", 23),
    ("j", 36),
    ("k", 37),
    ("l", 38),
    ("m", 50),
    ("n", 49),
    ("o", 24),
    ("p", 25),
    ("q", 16),
    ("r", 19),
    ("s", 31),
    ("t", 20),
    ("u", 22),
    ("v", 47),
    ("w", 17),
    ("x", 45),
    ("y", 21),
    ("z", 44),
    // Цифры верхнего ряда
    ("1", 2),
    ("2", 3),
    ("3", 4),
    ("4", 5),
    ("5", 6),
    ("6", 7),
    ("7", 8),
    ("8", 9),
    ("9", 10),
    ("0", 11),
    // Специальные
    ("escape", 1),
    ("enter", 28),
    ("space", 57),
    ("tab", 15),
    ("backspace", 14),
    ("insert", 110),
    ("delete", 111),
    ("home", 102),
    ("end", 107),
    ("pageup", 104),
    ("pagedown", 109),
    ("printscreen", 99),
    ("scrolllock", 70),
    ("pause", 119),
];

/// Преобразование имён клавиш из конфигурации в evdev коды
pub struct KeyNames;

impl KeyNames {
    pub fn translate(key_name: &str) -> Result<KeyCode, String> {
        let normalized = key_name.trim().to_lowercase();
        KEY_TABLE
            .iter()
            .find(|(name, _)| *name == normalized)
            .map(|(_, code)| KeyCode::new(*code))
            .ok_or_else(|| format!("Unknown key: {}", key_name))
    }

    pub fn reverse_translate(key: KeyCode) -> Option<&'static str> {
        KEY_TABLE
            .iter()
            .find(|(_, code)| *code == key.value())
            .map(|(name, _)| *name)
    }
}
