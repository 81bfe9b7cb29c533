/// One JSON question bank under the content directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bank {
    /// Short internal key, e.g. `ALG-LIN`.
    pub key: &'static str,
    pub topic: &'static str,
    pub subtopic: &'static str,
    /// File name relative to the content directory.
    pub file: &'static str,
}

const fn bank(
    key: &'static str,
    topic: &'static str,
    subtopic: &'static str,
    file: &'static str,
) -> Bank {
    Bank {
        key,
        topic,
        subtopic,
        file,
    }
}

/// Every bank the app ships with, grouped by topic.
pub const BANKS: &[Bank] = &[
    // Pre-Algebra & number sense
    bank("NUM-OPS", "Pre-Algebra", "Basic Operations", "number-operations.json"),
    bank("NUM-FAC", "Pre-Algebra", "Factors & Multiples", "number-factors.json"),
    bank("NUM-RAT", "Pre-Algebra", "Ratios & Proportions", "number-ratios.json"),
    // Algebra
    bank("ALG-MIX", "Algebra", "Mixed Practice", "algebra.json"),
    bank("ALG-LIN", "Algebra", "Linear Equations", "algebra-linear.json"),
    bank("ALG-INEQ", "Algebra", "Linear Inequalities", "algebra-linear-inequalities.json"),
    bank("ALG-SYS", "Algebra", "Systems of Linear Equations", "algebra-systems.json"),
    bank("ALG-EXP", "Algebra", "Exponents & Radicals", "algebra-exponents.json"),
    bank("ALG-QUA", "Algebra", "Solving Quadratics", "algebra-quadratics.json"),
    bank("ALG-ABS", "Algebra", "Absolute Value Equations", "algebra-absolute-value.json"),
    bank("ALG-WRD", "Algebra", "Word Problems", "algebra-word-problems.json"),
    // Algebra II
    bank("A2-POL", "Algebra II", "Polynomials & Rational Expressions", "algebra2-polynomials.json"),
    bank("A2-COM", "Algebra II", "Complex Numbers & Quadratics", "algebra2-complex.json"),
    // Functions
    bank("FUN-QUAD", "Functions", "Quadratic Functions", "functions-quadratic.json"),
    bank("FUN-TRN", "Functions", "Transformations & Composition", "functions-transformations.json"),
    // Coordinate geometry
    bank(
        "COO-DST",
        "Coordinate Geometry",
        "Distance & Midpoint",
        "coord-geometry-distance-midpoint.json",
    ),
    bank(
        "COO-LNP",
        "Coordinate Geometry",
        "Lines & Parabolas",
        "coord-geometry-lines-parabolas.json",
    ),
    bank("COO-CIR", "Coordinate Geometry", "Circles", "coord-geometry-circles.json"),
    // Geometry
    bank("GEO-ANG", "Geometry", "Angles & Lines", "geometry-angles.json"),
    bank("GEO-TRI", "Geometry", "Triangles", "geometry-triangles.json"),
    bank("GEO-CIR", "Geometry", "Circles", "geometry-circles.json"),
    bank("GEO-POL", "Geometry", "Polygons & Area", "geometry-polygons.json"),
    bank("GEO-3D", "Geometry", "3D Shapes & Volume", "geometry-3d.json"),
    // Trigonometry
    bank("TRI-RGT", "Trigonometry", "Right Triangles", "trig-right-triangles.json"),
    bank("TRI-UNT", "Trigonometry", "Unit Circle", "trig-unit-circle.json"),
    bank("TRI-GRA", "Trigonometry", "Graphs", "trig-graphs.json"),
    bank("TRI-IDN", "Trigonometry", "Identities & Advanced", "trig-identities.json"),
    // Statistics & probability
    bank("STA-DAT", "Statistics", "Data Analysis", "stats-data-analysis.json"),
    bank("STA-PRO", "Statistics", "Probability", "stats-probability.json"),
    bank("PRB-ADV", "Probability", "Advanced Probability", "probability-advanced.json"),
    // Precalculus
    bank("PRE-FUN", "Precalculus", "Functions & Graphs", "precalc-functions.json"),
    bank("PRE-LOG", "Precalculus", "Logarithms & Exponentials", "precalc-logs.json"),
    bank("PRE-SEQ", "Precalculus", "Sequences & Series", "precalc-sequences.json"),
    bank("PRE-CON", "Precalculus", "Conic Sections", "conic-sections.json"),
    // Less common
    bank("ADV-MAT", "Number & Quantity", "Matrices", "matrices.json"),
    bank("ADV-VEC", "Advanced", "Vectors", "vectors.json"),
];

/// Look up a bank by its key (case-insensitive).
#[must_use]
pub fn find_bank(key: &str) -> Option<&'static Bank> {
    BANKS.iter().find(|b| b.key.eq_ignore_ascii_case(key))
}
