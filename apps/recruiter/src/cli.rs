use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "recruiter")]
#[command(about = "Parse a CV, match it to job descriptions and draft interview questions", long_about = None)]
pub struct Args {
    /// CV file (.pdf or plain text)
    #[arg(long, value_name = "FILE")]
    pub cv: PathBuf,

    /// JSON file holding one job description or an array of them
    #[arg(long, value_name = "FILE")]
    pub jds: PathBuf,

    /// Position the candidate applied for
    #[arg(short, long, value_name = "TEXT")]
    pub position: Option<String>,

    /// Email that replaces the one found on the CV
    #[arg(long, value_name = "EMAIL")]
    pub override_email: Option<String>,

    /// Write the JSON report here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_all_flags() {
        let args = Args::try_parse_from([
            "recruiter",
            "--cv",
            "cv.pdf",
            "--jds",
            "jds.json",
            "--position",
            "Chuyên Toán",
            "--override-email",
            "a@example.com",
            "-o",
            "report.json",
        ])
        .unwrap();

        assert_eq!(args.cv, PathBuf::from("cv.pdf"));
        assert_eq!(args.position.as_deref(), Some("Chuyên Toán"));
        assert_eq!(args.override_email.as_deref(), Some("a@example.com"));
        assert_eq!(args.output, Some(PathBuf::from("report.json")));
    }

    #[test]
    fn test_cv_and_jds_are_required() {
        assert!(Args::try_parse_from(["recruiter", "--cv", "cv.pdf"]).is_err());
        assert!(Args::try_parse_from(["recruiter", "--jds", "jds.json"]).is_err());
    }
}
