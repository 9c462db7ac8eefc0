use strum::EnumString;

#[derive(Debug, Default, EnumString, Clone, Copy, PartialEq, Eq)]
#[strum(ascii_case_insensitive)]
pub enum OutputFormat {
    #[default]
    #[strum(serialize = "yaml", serialize = "y")]
    Yaml,
    #[strum(serialize = "json", serialize = "j")]
    Json,
}
