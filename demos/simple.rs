use tabletest::{reflect_record, Harness, Recorder, Reporter};

#[derive(Debug, Clone)]
struct Roots {
    small: f64,
    large: f64,
}
reflect_record!(Roots { small, large });

#[derive(Debug, Clone)]
struct Quadratic {
    a: f64,
    b: f64,
    c: f64,
}
reflect_record!(Quadratic { a, b, c });

/// Real roots of `a·x² + b·x + c`, smaller first.
fn roots(a: f64, b: f64, c: f64) -> (f64, f64) {
    let disc = (b * b - 4.0 * a * c).sqrt();
    let (x1, x2) = ((-b - disc) / (2.0 * a), (-b + disc) / (2.0 * a));
    (x1.min(x2), x1.max(x2))
}

/// Prints everything to stdout.
struct Stdout;

impl Reporter for Stdout {
    fn log(&mut self, message: &str) {
        println!("{message}");
    }

    fn fail(&mut self, message: &str) {
        println!("!! {message}");
    }
}

pub fn main() {
    let inputs = vec![
        Quadratic { a: 1.0, b: -3.0, c: 2.0 },
        Quadratic { a: 1.0, b: 0.0, c: -2.0 },
        Quadratic { a: 2.0, b: 4.0, c: -6.0 },
    ];
    let expected = vec![
        Roots { small: 1.0, large: 2.0 },
        Roots { small: -1.414213, large: 1.414213 },
        Roots { small: -3.0, large: 1.0 },
    ];

    println!("====================");
    println!("\tDefault tolerance");
    println!("====================");
    let report = match tabletest::run_all(&roots, &inputs, &expected, &mut Stdout) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("malformed table: {err}");
            return;
        }
    };
    println!("{report}");

    println!("====================");
    println!("\tLoose tolerance");
    println!("====================");
    let loose = Harness::new(tabletest::Config::default().with_epsilon(1e-3));
    let mut recorder = Recorder::new();
    match loose.run_all(&roots, &inputs, &expected, &mut recorder) {
        Ok(report) => println!("{report}"),
        Err(err) => eprintln!("malformed table: {err}"),
    }
}
