use clap::{ Arg, Command };
use env_logger::{ Builder, Env, Target };
use log::{ error, info };

use std::error::Error;
use std::path::PathBuf;
use std::process;

use plate_ocr::config::{ DetectParams, OcrConfig, RunConfig };
use plate_ocr::ocr::PlateReader;
use plate_ocr::utils::{ LogTee, Viewer };
use plate_ocr::Lpr;


fn main() -> Result<(), Box<dyn Error>> {
    let matches = Command::new("plate-ocr")
                    .version("0.1.0")
                    .about("Find the license plate in a car photo and read its number")
                    .arg(Arg::new("INPUT")
                        .help("image file with a license plate")
                        .index(1))
                    .arg(Arg::new("output")
                        .long("output")
                        .help("where the processed plate is written"))
                    .arg(Arg::new("log")
                        .long("log")
                        .help("debug log file, truncated on every run"))
                    .arg(Arg::new("tessdata")
                        .long("tessdata")
                        .help("tesseract data directory"))
                    .arg(Arg::new("lang")
                        .long("lang")
                        .help("language of the in-memory pass"))
                    .arg(Arg::new("line-lang")
                        .long("line-lang")
                        .help("language of the single line pass"))
                    .arg(Arg::new("snapshots")
                        .long("snapshots")
                        .help("directory receiving every intermediate image"))
                    .get_matches();

    let mut run = RunConfig::default();
    if let Some(input) = matches.get_one::<String>("INPUT") {
        run.input = PathBuf::from(input);
    }
    if let Some(output) = matches.get_one::<String>("output") {
        run.processed = PathBuf::from(output);
    }
    if let Some(log) = matches.get_one::<String>("log") {
        run.debug_log = PathBuf::from(log);
    }
    run.snapshots = matches.get_one::<String>("snapshots").map(PathBuf::from);

    let mut ocr_config = OcrConfig::default();
    ocr_config.tessdata = matches.get_one::<String>("tessdata").cloned();
    if let Some(lang) = matches.get_one::<String>("lang") {
        ocr_config.buffer_lang = lang.clone();
    }
    if let Some(lang) = matches.get_one::<String>("line-lang") {
        ocr_config.line_lang = lang.clone();
    }

    let tee = LogTee::create(&run.debug_log)?;
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .target(Target::Pipe(Box::new(tee)))
        .init();

    let img = match image::open(&run.input) {
        Ok(img) => img,
        Err(e) => {
            error!("Could not load image {}: {}", run.input.display(), e);
            process::exit(1);
        }
    };

    let mut reader = match PlateReader::new(&ocr_config) {
        Ok(reader) => reader,
        Err(e) => {
            error!("Tesseract initialization failed! {}", e);
            process::exit(1);
        }
    };

    let lpr = Lpr::new(DetectParams::default(), Viewer::new(run.snapshots.clone()));
    let recognition = match lpr.recognize(&img, &mut reader, &run.processed) {
        Ok(recognition) => recognition,
        Err(e) => {
            error!("Exception caught: {}", e);
            None
        }
    };

    println!("Detected contours: {}", lpr.contour_count());
    let number = recognition.as_ref()
        .and_then(|r| r.plate_number.clone())
        .unwrap_or_else(|| "0".to_string());
    if let Some(recognition) = &recognition {
        info!("Line Text: {}", recognition.line_text.trim_end());
    }
    println!("carNumber : {}", number);

    Ok(())
}
