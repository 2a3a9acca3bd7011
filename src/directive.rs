use std::fmt;

const KEYWORD_RUN: &str = "run";
const KEYWORD_THERMO: &str = "thermo";
const KEYWORD_THERMO_STYLE: &str = "thermo_style";
const THERMO_STYLE_CUSTOM: &str = "custom";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Run,
    Thermo,
    ThermoStyle,
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Run => write!(f, "run <steps>"),
            Self::Thermo => write!(f, "thermo <interval>"),
            Self::ThermoStyle => write!(f, "thermo_style custom <columns>"),
        }
    }
}

/// A single log line, classified by its leading tokens.
#[derive(Debug, PartialEq)]
pub enum LogLine<'a> {
    Run(u64),
    Thermo(u64),
    ThermoStyle(Vec<&'a str>),
    Numeric(Vec<f64>),
    Blank,
    Other,
}

impl<'a> LogLine<'a> {
    pub fn classify(line: &'a str) -> Self {
        let tokens = line.split_whitespace().collect::<Vec<_>>();
        match tokens.as_slice() {
            [] => Self::Blank,
            [KEYWORD_RUN, steps, ..] => steps.parse().map_or(Self::Other, Self::Run),
            [KEYWORD_THERMO, interval, ..] => interval.parse().map_or(Self::Other, Self::Thermo),
            [KEYWORD_THERMO_STYLE, THERMO_STYLE_CUSTOM, columns @ ..] => {
                Self::ThermoStyle(columns.to_vec())
            }
            _ => parse_row(&tokens).map_or(Self::Other, Self::Numeric),
        }
    }
}

/// Parses every token as `f64`, failing with the first token that is not a number.
pub fn parse_row<'a>(tokens: &[&'a str]) -> Result<Vec<f64>, &'a str> {
    tokens
        .iter()
        .map(|token| token.parse::<f64>().map_err(|_| *token))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_directives() {
        assert_eq!(LogLine::classify("run 1000"), LogLine::Run(1000));
        assert_eq!(LogLine::classify("  run   50 upto"), LogLine::Run(50));
        assert_eq!(LogLine::classify("thermo 100"), LogLine::Thermo(100));
        assert_eq!(
            LogLine::classify("thermo_style custom step temp press"),
            LogLine::ThermoStyle(vec!["step", "temp", "press"])
        );
        assert_eq!(
            LogLine::classify("thermo_style custom"),
            LogLine::ThermoStyle(vec![])
        );
    }

    #[test]
    fn test_classify_not_directives() {
        assert_eq!(LogLine::classify("run ${nsteps}"), LogLine::Other);
        assert_eq!(LogLine::classify("thermo_modify norm no"), LogLine::Other);
        assert_eq!(LogLine::classify("thermo_style one"), LogLine::Other);
        assert_eq!(LogLine::classify("Setting up Verlet run ..."), LogLine::Other);
        assert_eq!(LogLine::classify("Step Temp Press"), LogLine::Other);
    }

    #[test]
    fn test_classify_rows() {
        assert_eq!(LogLine::classify(""), LogLine::Blank);
        assert_eq!(LogLine::classify("   \t "), LogLine::Blank);
        assert_eq!(
            LogLine::classify("  0   300.5 -1.25e3"),
            LogLine::Numeric(vec![0.0, 300.5, -1250.0])
        );
        assert_eq!(LogLine::classify("0 300.5 NaN_corrupt"), LogLine::Other);
    }

    #[test]
    fn test_parse_row_reports_token() {
        assert_eq!(parse_row(&["1", "2.5"]), Ok(vec![1.0, 2.5]));
        assert_eq!(parse_row(&["1", "x1", "y"]), Err("x1"));
    }
}
