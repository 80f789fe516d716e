use crate::CLAP_STYLING;
use clap::{arg, command};
use url::Url;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("sift")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("sift")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress the progress spinner and non-essential output").required(false))
        .arg(arg!(-v --"verbose" "Log crawl details to stderr").required(false))
        .subcommand_required(true)
        .subcommand(
            command!("rank")
                .about(
                    "Rank search candidates by the AI-relevant content found on them and the \
                pages they link to.",
                )
                .arg(
                    arg!(-k --"keyword" <KEYWORD>)
                        .required(true)
                        .help("The user's search keyword"),
                )
                .arg(
                    arg!(-c --"candidates" <PATH>)
                        .required(true)
                        .help(
                            "JSON array of {url, title, snippet} objects, or a newline-delimited \
                        list of URLs",
                        )
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(--"config" <PATH>)
                        .required(false)
                        .help("Path to a JSON ranking configuration")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(--"depth" <DEPTH>)
                        .required(false)
                        .help("Maximum crawl depth; the candidate itself is depth 1")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"floor" <SCORE>)
                        .required(false)
                        .help("Minimum total score for results without a keyword hit")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of candidates crawled at the same time")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"deadline" <SECONDS>)
                        .required(false)
                        .help("Stop crawling after this many seconds and score what completed")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json, csv, markdown")
                        .value_parser(["text", "json", "csv", "markdown"])
                        .default_value("text"),
                )
                .arg(
                    arg!(--"show-trees")
                        .required(false)
                        .help("Print the scored crawl tree of every ranked candidate")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            command!("tree")
                .about("Crawl a single URL and print its scored link tree")
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The URL to crawl")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(-k --"keyword" <KEYWORD>)
                        .required(true)
                        .help("The user's search keyword"),
                )
                .arg(
                    arg!(--"config" <PATH>)
                        .required(false)
                        .help("Path to a JSON ranking configuration")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(--"depth" <DEPTH>)
                        .required(false)
                        .help("Maximum crawl depth; the URL itself is depth 1")
                        .value_parser(clap::value_parser!(usize)),
                ),
        )
}
