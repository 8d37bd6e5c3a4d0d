use crate::{
    add_native_word,
    runtime::{
        data_structures::value::{
            matrix_entry_count, ComplexMatrix, RealMatrix, ToValue, Value, MAX_MATRIX_ENTRIES,
        },
        error::{self, script_error, ErrorKind, ScriptError},
        interpreter::Interpreter,
    },
};
use nalgebra::{
    linalg::{Schur, SymmetricEigen},
    Complex, ComplexField, DMatrix, Scalar,
};
use rand::Rng;
use std::f64::consts::PI;

/// Iteration cap for the iterative decompositions.
const MAX_ITERATIONS: usize = 1000;

/// Singular values below this are treated as zero by `pinv`.
const PSEUDO_INVERSE_EPSILON: f64 = 1e-12;

/// Two matrix operands brought to a common element type.
enum MatrixPair {
    Real(RealMatrix, RealMatrix),
    Complex(ComplexMatrix, ComplexMatrix),
}

fn matrix_pair(name: &str, a: Value, b: Value) -> error::Result<MatrixPair> {
    match (a, b) {
        (Value::MatrixReal(a), Value::MatrixReal(b)) => Ok(MatrixPair::Real(a, b)),

        (a, b) => match (a.as_complex_matrix_widened(), b.as_complex_matrix_widened()) {
            (Some(a), Some(b)) => Ok(MatrixPair::Complex(a, b)),
            _ => ScriptError::bare(
                ErrorKind::TypeMismatch,
                &format!(
                    "{} needs two matrices, found a {} and a {}.",
                    name,
                    a.type_name(),
                    b.type_name()
                ),
            ),
        },
    }
}

fn pop_matrix(interpreter: &mut dyn Interpreter, name: &str) -> error::Result<Value> {
    if !interpreter.peek()?.is_matrix() {
        return script_error(
            interpreter,
            ErrorKind::TypeMismatch,
            format!("{} needs a matrix, found a {}.", name, interpreter.peek()?.type_name()),
        );
    }

    interpreter.pop()
}

fn require_square(name: &str, value: &Value) -> error::Result<usize> {
    let (rows, cols) = value.shape();

    if rows != cols {
        return ScriptError::bare(
            ErrorKind::DimensionMismatch,
            &format!("{} needs a square matrix, found {} x {}.", name, rows, cols),
        );
    }

    Ok(rows)
}

fn decomposition_failed<T>(name: &str) -> error::Result<T> {
    ScriptError::bare(
        ErrorKind::DecompositionFailed,
        &format!("{} could not decompose the matrix.", name),
    )
}

/// The main diagonal as a `1 x min(rows, cols)` row.
fn diagonal_row<T: Scalar + Copy>(matrix: &DMatrix<T>) -> DMatrix<T> {
    let size = matrix.nrows().min(matrix.ncols());

    DMatrix::from_fn(1, size, |_, index| matrix[(index, index)])
}

/// The entries of a matrix read row by row.
fn row_major<T: Scalar + Copy>(matrix: &DMatrix<T>) -> Vec<T> {
    matrix.transpose().iter().copied().collect()
}

fn reshape<T: Scalar + Copy>(
    matrix: &DMatrix<T>,
    rows: usize,
    cols: usize,
) -> error::Result<DMatrix<T>> {
    if matrix_entry_count(rows, cols) != Some(matrix.len()) {
        return ScriptError::bare(
            ErrorKind::DimensionMismatch,
            &format!(
                "Can't reshape {} entries into a {} x {} matrix.",
                matrix.len(),
                rows,
                cols
            ),
        );
    }

    Ok(DMatrix::from_row_slice(rows, cols, &row_major(matrix)))
}

fn join<T: Scalar + Copy>(
    a: &DMatrix<T>,
    b: &DMatrix<T>,
    vertical: bool,
) -> error::Result<DMatrix<T>> {
    if vertical {
        if a.ncols() != b.ncols() {
            return ScriptError::bare(
                ErrorKind::DimensionMismatch,
                &format!(
                    "join_v needs equal column counts, found {} and {}.",
                    a.ncols(),
                    b.ncols()
                ),
            );
        }

        let top = a.nrows();

        Ok(DMatrix::from_fn(top + b.nrows(), a.ncols(), |row, col| {
            if row < top {
                a[(row, col)]
            } else {
                b[(row - top, col)]
            }
        }))
    } else {
        if a.nrows() != b.nrows() {
            return ScriptError::bare(
                ErrorKind::DimensionMismatch,
                &format!(
                    "join_h needs equal row counts, found {} and {}.",
                    a.nrows(),
                    b.nrows()
                ),
            );
        }

        let left = a.ncols();

        Ok(DMatrix::from_fn(a.nrows(), left + b.ncols(), |row, col| {
            if col < left {
                a[(row, col)]
            } else {
                b[(row, col - left)]
            }
        }))
    }
}

/// Running sums along each row, or down each column.
fn cumulative_sum<T: ComplexField + Copy>(matrix: &DMatrix<T>, along_rows: bool) -> DMatrix<T> {
    let mut result = matrix.clone();

    if along_rows {
        for row in 0..result.nrows() {
            for col in 1..result.ncols() {
                result[(row, col)] = result[(row, col - 1)] + result[(row, col)];
            }
        }
    } else {
        for col in 0..result.ncols() {
            for row in 1..result.nrows() {
                result[(row, col)] = result[(row - 1, col)] + result[(row, col)];
            }
        }
    }

    result
}

/// A square matrix holding a vector on its diagonal.
fn to_diagonal<T: ComplexField + Copy>(vector: &DMatrix<T>) -> error::Result<DMatrix<T>> {
    if vector.nrows() != 1 && vector.ncols() != 1 {
        return ScriptError::bare(
            ErrorKind::DimensionMismatch,
            &format!(
                "to_diag needs a row or column vector, found {} x {}.",
                vector.nrows(),
                vector.ncols()
            ),
        );
    }

    let size = vector.len();
    let mut result = DMatrix::zeros(size, size);

    for (index, entry) in vector.iter().enumerate() {
        result[(index, index)] = *entry;
    }

    Ok(result)
}

fn singular_value_decomposition<T: ComplexField<RealField = f64> + Copy>(
    matrix: DMatrix<T>,
) -> Option<(DMatrix<T>, RealMatrix, DMatrix<T>)> {
    let svd = matrix.try_svd(true, true, f64::EPSILON, MAX_ITERATIONS)?;
    let singular = RealMatrix::from_diagonal(&svd.singular_values);

    Some((svd.u?, singular, svd.v_t?.adjoint()))
}

fn is_symmetric(matrix: &RealMatrix) -> bool {
    let scale = matrix.amax().max(1.0);

    (matrix - matrix.transpose()).amax() <= 1e-12 * scale
}

/// Eigenvalues from the complex Schur form, with each eigenvector taken as the right singular
/// vector of `A - λI` for its smallest singular value.
pub fn complex_eigen(matrix: &ComplexMatrix) -> Option<(ComplexMatrix, Vec<Complex<f64>>)> {
    let size = matrix.nrows();
    let (_, triangular) = Schur::try_new(matrix.clone(), f64::EPSILON, MAX_ITERATIONS)?.unpack();
    let values: Vec<Complex<f64>> = triangular.diagonal().iter().copied().collect();
    let mut vectors = ComplexMatrix::zeros(size, size);

    for (col, value) in values.iter().enumerate() {
        let shifted = matrix - ComplexMatrix::identity(size, size) * *value;
        let svd = shifted.try_svd(false, true, f64::EPSILON, MAX_ITERATIONS)?;
        let (smallest, _) = svd
            .singular_values
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))?;

        let vector = svd.v_t?.row(smallest).adjoint();
        vectors.set_column(col, &vector);
    }

    Some((vectors, values))
}

/// Invert a square matrix.
///
/// Signature: `M -- inv(M)`
fn word_inverse(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let matrix = pop_matrix(interpreter, "minv")?;
    require_square("minv", &matrix)?;

    let result = match matrix {
        Value::MatrixReal(m) => m.try_inverse().map(Value::MatrixReal),
        Value::MatrixComplex(m) => m.try_inverse().map(Value::MatrixComplex),
        _ => None,
    };

    match result {
        Some(inverse) => interpreter.push(inverse),
        None => ScriptError::bare(ErrorKind::DecompositionFailed, "The matrix is singular."),
    }
}

/// Moore-Penrose pseudo inverse.
///
/// Signature: `M -- pinv(M)`
fn word_pseudo_inverse(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let result = match pop_matrix(interpreter, "pinv")? {
        Value::MatrixReal(m) => m
            .pseudo_inverse(PSEUDO_INVERSE_EPSILON)
            .map(Value::MatrixReal),
        Value::MatrixComplex(m) => m
            .pseudo_inverse(PSEUDO_INVERSE_EPSILON)
            .map(Value::MatrixComplex),
        _ => Err("not a matrix"),
    };

    match result {
        Ok(inverse) => interpreter.push(inverse),
        Err(_) => decomposition_failed("pinv"),
    }
}

/// Determinant of a square matrix.
///
/// Signature: `M -- det(M)`
fn word_determinant(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let matrix = pop_matrix(interpreter, "det")?;
    require_square("det", &matrix)?;

    let result = match matrix {
        Value::MatrixComplex(m) => Value::Complex(m.determinant()),
        Value::MatrixReal(m) => Value::Real(m.determinant()),
        other => other,
    };

    interpreter.push(result)
}

/// Eigen decomposition.  Real symmetric matrices give real results, anything else is decomposed
/// over the complex numbers.
///
/// Signature: `M -- V D`
fn word_eigen(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let matrix = pop_matrix(interpreter, "eig")?;
    require_square("eig", &matrix)?;

    if let Value::MatrixReal(m) = &matrix {
        if is_symmetric(m) {
            let Some(eigen) = SymmetricEigen::try_new(m.clone(), f64::EPSILON, MAX_ITERATIONS)
            else {
                return decomposition_failed("eig");
            };

            interpreter.push(Value::MatrixReal(eigen.eigenvectors))?;
            return interpreter.push(Value::MatrixReal(RealMatrix::from_diagonal(
                &eigen.eigenvalues,
            )));
        }
    }

    let Some(widened) = matrix.as_complex_matrix_widened() else {
        return decomposition_failed("eig");
    };

    let Some((vectors, values)) = complex_eigen(&widened) else {
        return decomposition_failed("eig");
    };

    let mut diagonal = ComplexMatrix::zeros(values.len(), values.len());

    for (index, value) in values.into_iter().enumerate() {
        diagonal[(index, index)] = value;
    }

    interpreter.push(Value::MatrixComplex(vectors))?;
    interpreter.push(Value::MatrixComplex(diagonal))
}

/// Transpose.
///
/// Signature: `M -- M'`
fn word_transpose(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let result = match pop_matrix(interpreter, "tran")? {
        Value::MatrixReal(m) => Value::MatrixReal(m.transpose()),
        Value::MatrixComplex(m) => Value::MatrixComplex(m.transpose()),
        other => other,
    };

    interpreter.push(result)
}

/// Reshape a matrix, keeping its entries in row major order.
///
/// Signature: `M rows cols -- M'`
fn word_reshape(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.stack().require(3)?;

    let cols = interpreter.pop_as_index()?;
    let rows = interpreter.pop_as_index()?;

    let result = match pop_matrix(interpreter, "reshape")? {
        Value::MatrixReal(m) => Value::MatrixReal(reshape(&m, rows, cols)?),
        Value::MatrixComplex(m) => Value::MatrixComplex(reshape(&m, rows, cols)?),
        other => other,
    };

    interpreter.push(result)
}

fn check_index(value: &Value, row: usize, col: usize) -> error::Result<()> {
    let (rows, cols) = value.shape();

    if row >= rows || col >= cols {
        return ScriptError::bare(
            ErrorKind::InvalidArgument,
            &format!("Index ({}, {}) is outside a {} x {} matrix.", row, col, rows, cols),
        );
    }

    Ok(())
}

/// Copy out one entry, leaving the matrix in place.  Indices start at 0.
///
/// Signature: `M i j -- M x`
fn word_get_entry(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.stack().require(3)?;

    let col = interpreter.pop_as_index()?;
    let row = interpreter.pop_as_index()?;

    let entry = match interpreter.peek()? {
        matrix @ Value::MatrixReal(m) => {
            check_index(matrix, row, col)?;
            Value::Real(m[(row, col)])
        }

        matrix @ Value::MatrixComplex(m) => {
            check_index(matrix, row, col)?;
            Value::Complex(m[(row, col)])
        }

        other => {
            return script_error(
                interpreter,
                ErrorKind::TypeMismatch,
                format!("get_aij needs a matrix, found a {}.", other.type_name()),
            );
        }
    };

    interpreter.push(entry)
}

/// Replace one entry.  A complex entry promotes a real matrix.
///
/// Signature: `M x i j -- M'`
fn word_set_entry(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.stack().require(4)?;

    let col = interpreter.pop_as_index()?;
    let row = interpreter.pop_as_index()?;
    let entry = interpreter.pop()?;
    let matrix = pop_matrix(interpreter, "set_aij")?;

    check_index(&matrix, row, col)?;

    let result = match (matrix, entry) {
        (Value::MatrixReal(mut m), Value::Real(x)) => {
            m[(row, col)] = x;
            Value::MatrixReal(m)
        }

        (matrix, entry) => match (matrix.as_complex_matrix_widened(), entry.as_complex_scalar()) {
            (Some(mut m), Some(x)) => {
                m[(row, col)] = x;
                Value::MatrixComplex(m)
            }

            _ => {
                return script_error(
                    interpreter,
                    ErrorKind::TypeMismatch,
                    format!("set_aij needs a number, found a {}.", entry.type_name()),
                );
            }
        },
    };

    interpreter.push(result)
}

/// Kronecker product.
///
/// Signature: `A B -- A⊗B`
fn word_kronecker(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.stack().require(2)?;

    let b = interpreter.pop()?;
    let a = interpreter.pop()?;

    let ((a_rows, a_cols), (b_rows, b_cols)) = (a.shape(), b.shape());
    let rows = a_rows.saturating_mul(b_rows);
    let cols = a_cols.saturating_mul(b_cols);
    check_shape("kron", rows, cols)?;

    let result = match matrix_pair("kron", a, b)? {
        MatrixPair::Real(a, b) => Value::MatrixReal(a.kronecker(&b)),
        MatrixPair::Complex(a, b) => Value::MatrixComplex(a.kronecker(&b)),
    };

    interpreter.push(result)
}

/// The main diagonal as a row.
///
/// Signature: `M -- diagonal`
fn word_diagonal(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let result = match pop_matrix(interpreter, "diag")? {
        Value::MatrixReal(m) => Value::MatrixReal(diagonal_row(&m)),
        Value::MatrixComplex(m) => Value::MatrixComplex(diagonal_row(&m)),
        other => other,
    };

    interpreter.push(result)
}

/// Signature: `vector -- M`
fn word_to_diagonal(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let result = match pop_matrix(interpreter, "to_diag")? {
        Value::MatrixReal(m) => Value::MatrixReal(to_diagonal(&m)?),
        Value::MatrixComplex(m) => Value::MatrixComplex(to_diagonal(&m)?),
        other => other,
    };

    interpreter.push(result)
}

/// Lower Cholesky factor of a positive definite matrix.
///
/// Signature: `M -- L`
fn word_cholesky(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let matrix = pop_matrix(interpreter, "chol")?;
    require_square("chol", &matrix)?;

    let result = match matrix {
        Value::MatrixReal(m) => m.cholesky().map(|factor| Value::MatrixReal(factor.l())),
        Value::MatrixComplex(m) => m.cholesky().map(|factor| Value::MatrixComplex(factor.l())),
        _ => None,
    };

    match result {
        Some(factor) => interpreter.push(factor),
        None => ScriptError::bare(
            ErrorKind::DecompositionFailed,
            "The matrix is not positive definite.",
        ),
    }
}

/// Singular value decomposition, `M = U S V'`.
///
/// Signature: `M -- U S V`
fn word_svd(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let results = match pop_matrix(interpreter, "svd")? {
        Value::MatrixReal(m) => singular_value_decomposition(m)
            .map(|(u, s, v)| (Value::MatrixReal(u), s, Value::MatrixReal(v))),
        Value::MatrixComplex(m) => singular_value_decomposition(m)
            .map(|(u, s, v)| (Value::MatrixComplex(u), s, Value::MatrixComplex(v))),
        _ => None,
    };

    let Some((u, s, v)) = results else {
        return decomposition_failed("svd");
    };

    interpreter.push(u)?;
    interpreter.push(Value::MatrixReal(s))?;
    interpreter.push(v)
}

/// Signature: `M -- M rows cols`
fn word_dimensions(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let (rows, cols) = match interpreter.peek()? {
        matrix if matrix.is_matrix() => matrix.shape(),
        other => {
            return script_error(
                interpreter,
                ErrorKind::TypeMismatch,
                format!("dim needs a matrix, found a {}.", other.type_name()),
            );
        }
    };

    interpreter.push(rows.to_value())?;
    interpreter.push(cols.to_value())
}

fn pop_positive_size(interpreter: &mut dyn Interpreter, name: &str) -> error::Result<usize> {
    let size = interpreter.pop_as_index()?;

    if size == 0 {
        return script_error(
            interpreter,
            ErrorKind::InvalidArgument,
            format!("{} needs a size of 1 or more.", name),
        );
    }

    Ok(size)
}

fn check_shape(name: &str, rows: usize, cols: usize) -> error::Result<()> {
    if matrix_entry_count(rows, cols).is_none() {
        return ScriptError::bare(
            ErrorKind::InvalidArgument,
            &format!(
                "{} can't build a {} x {} matrix, the limit is {} entries.",
                name, rows, cols, MAX_MATRIX_ENTRIES
            ),
        );
    }

    Ok(())
}

fn pop_shape(interpreter: &mut dyn Interpreter, name: &str) -> error::Result<(usize, usize)> {
    interpreter.stack().require(2)?;

    let cols = pop_positive_size(interpreter, name)?;
    let rows = pop_positive_size(interpreter, name)?;
    check_shape(name, rows, cols)?;

    Ok((rows, cols))
}

/// Signature: `n -- I`
fn word_identity(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let size = pop_positive_size(interpreter, "eye")?;
    check_shape("eye", size, size)?;

    interpreter.push(Value::MatrixReal(RealMatrix::identity(size, size)))
}

/// Signature: `rows cols -- M`
fn word_ones(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let (rows, cols) = pop_shape(interpreter, "ones")?;

    interpreter.push(Value::MatrixReal(RealMatrix::from_element(rows, cols, 1.0)))
}

/// Signature: `rows cols -- M`
fn word_zeroes(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let (rows, cols) = pop_shape(interpreter, "zeroes")?;

    interpreter.push(Value::MatrixReal(RealMatrix::zeros(rows, cols)))
}

/// Uniform random entries in `[0, 1)`.
///
/// Signature: `rows cols -- M`
fn word_random(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let (rows, cols) = pop_shape(interpreter, "rand")?;
    let mut rng = rand::thread_rng();

    interpreter.push(Value::MatrixReal(RealMatrix::from_fn(rows, cols, |_, _| {
        rng.r#gen::<f64>()
    })))
}

/// Standard normal random entries.
///
/// Signature: `rows cols -- M`
fn word_random_normal(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let (rows, cols) = pop_shape(interpreter, "randn")?;
    let mut rng = rand::thread_rng();

    // Box-Muller, u1 in (0, 1].
    let matrix = RealMatrix::from_fn(rows, cols, |_, _| {
        let u1 = 1.0 - rng.r#gen::<f64>();
        let u2 = rng.r#gen::<f64>();

        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    });

    interpreter.push(Value::MatrixReal(matrix))
}

/// The row `0 1 ... n-1`.
///
/// Signature: `n -- row`
fn word_row_range(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let size = pop_positive_size(interpreter, "rrange")?;
    check_shape("rrange", 1, size)?;

    interpreter.push(Value::MatrixReal(RealMatrix::from_fn(1, size, |_, col| {
        col as f64
    })))
}

fn join_words(interpreter: &mut dyn Interpreter, name: &str, vertical: bool) -> error::Result<()> {
    interpreter.stack().require(2)?;

    let b = interpreter.pop()?;
    let a = interpreter.pop()?;

    let result = match matrix_pair(name, a, b)? {
        MatrixPair::Real(a, b) => Value::MatrixReal(join(&a, &b, vertical)?),
        MatrixPair::Complex(a, b) => Value::MatrixComplex(join(&a, &b, vertical)?),
    };

    interpreter.push(result)
}

/// Stack two matrices, the first above the second.
///
/// Signature: `A B -- [A; B]`
fn word_join_vertical(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    join_words(interpreter, "join_v", true)
}

/// Place two matrices side by side.
///
/// Signature: `A B -- [A B]`
fn word_join_horizontal(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    join_words(interpreter, "join_h", false)
}

fn cumulative_sum_word(
    interpreter: &mut dyn Interpreter,
    name: &str,
    along_rows: bool,
) -> error::Result<()> {
    let result = match pop_matrix(interpreter, name)? {
        Value::MatrixReal(m) => Value::MatrixReal(cumulative_sum(&m, along_rows)),
        Value::MatrixComplex(m) => Value::MatrixComplex(cumulative_sum(&m, along_rows)),
        other => other,
    };

    interpreter.push(result)
}

/// Signature: `M -- M'`
fn word_cumulative_sum_rows(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    cumulative_sum_word(interpreter, "cumsum_r", true)
}

/// Signature: `M -- M'`
fn word_cumulative_sum_columns(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    cumulative_sum_word(interpreter, "cumsum_c", false)
}

/// Push every entry of a matrix, row by row.
///
/// Signature: `M -- a11 a12 ... amn`
fn word_split_matrix(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let matrix = pop_matrix(interpreter, "split_mat")?;
    let (rows, cols) = matrix.shape();

    interpreter.stack().require_room(rows * cols)?;

    match matrix {
        Value::MatrixReal(m) => {
            for entry in row_major(&m) {
                interpreter.push(Value::Real(entry))?;
            }
        }

        Value::MatrixComplex(m) => {
            for entry in row_major(&m) {
                interpreter.push(Value::Complex(entry))?;
            }
        }

        _ => (),
    }

    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Reduction {
    Sum,
    Mean,
    Variance,
    Min,
    Max,
}

/// The columns, or the rows, of a matrix as vectors.
fn lines<T: Scalar + Copy>(matrix: &DMatrix<T>, by_column: bool) -> Vec<Vec<T>> {
    if by_column {
        matrix
            .column_iter()
            .map(|column| column.iter().copied().collect())
            .collect()
    } else {
        matrix
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect()
    }
}

/// A result row for column reductions, a result column for row reductions.
fn shape_result<T: Scalar + Copy>(values: Vec<T>, by_column: bool) -> DMatrix<T> {
    if by_column {
        DMatrix::from_row_slice(1, values.len(), &values)
    } else {
        DMatrix::from_column_slice(values.len(), 1, &values)
    }
}

/// Sample variance, 0 for a single entry.
fn denominator(count: usize) -> f64 {
    count.saturating_sub(1).max(1) as f64
}

fn reduce_real(line: &[f64], reduction: Reduction) -> f64 {
    let count = line.len() as f64;
    let sum: f64 = line.iter().sum();

    match reduction {
        Reduction::Sum => sum,
        Reduction::Mean => sum / count,
        Reduction::Variance => {
            let mean = sum / count;
            line.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / denominator(line.len())
        }
        Reduction::Min => line.iter().copied().fold(f64::INFINITY, f64::min),
        Reduction::Max => line.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    }
}

fn reduce_complex_sum(line: &[Complex<f64>], mean: bool) -> Complex<f64> {
    let sum: Complex<f64> = line.iter().sum();

    if mean {
        sum / line.len() as f64
    } else {
        sum
    }
}

fn complex_variance(line: &[Complex<f64>]) -> f64 {
    let mean = reduce_complex_sum(line, true);

    line.iter().map(|x| (x - mean).norm_sqr()).sum::<f64>() / denominator(line.len())
}

/// Reduce each column (`by_column`) or each row of a matrix.
fn reduce(
    name: &str,
    value: &Value,
    by_column: bool,
    reduction: Reduction,
) -> error::Result<Value> {
    let result = match value {
        Value::MatrixReal(m) => {
            let values = lines(m, by_column)
                .iter()
                .map(|line| reduce_real(line, reduction))
                .collect();

            Value::MatrixReal(shape_result(values, by_column))
        }

        Value::MatrixComplex(m) => {
            let lines = lines(m, by_column);

            match reduction {
                Reduction::Sum | Reduction::Mean => {
                    let mean = reduction == Reduction::Mean;
                    let values = lines
                        .iter()
                        .map(|line| reduce_complex_sum(line, mean))
                        .collect();

                    Value::MatrixComplex(shape_result(values, by_column))
                }

                Reduction::Variance => {
                    let values = lines.iter().map(|line| complex_variance(line)).collect();
                    Value::MatrixReal(shape_result(values, by_column))
                }

                Reduction::Min | Reduction::Max => {
                    return ScriptError::bare(
                        ErrorKind::TypeMismatch,
                        &format!("{} needs a real matrix.", name),
                    );
                }
            }
        }

        other => {
            return ScriptError::bare(
                ErrorKind::TypeMismatch,
                &format!("{} needs a matrix, found a {}.", name, other.type_name()),
            );
        }
    };

    Ok(result)
}

macro_rules! reduction_word {
    ($function:ident, $name:literal, $by_column:expr, $reduction:expr) => {
        fn $function(interpreter: &mut dyn Interpreter) -> error::Result<()> {
            let matrix = interpreter.pop()?;
            let result = reduce($name, &matrix, $by_column, $reduction)?;

            interpreter.push(result)
        }
    };
}

reduction_word!(word_column_sum, "csum", true, Reduction::Sum);
reduction_word!(word_row_sum, "rsum", false, Reduction::Sum);
reduction_word!(word_column_mean, "cmean", true, Reduction::Mean);
reduction_word!(word_row_mean, "rmean", false, Reduction::Mean);
reduction_word!(word_column_variance, "cvar", true, Reduction::Variance);
reduction_word!(word_row_variance, "rvar", false, Reduction::Variance);
reduction_word!(word_column_min, "cmin", true, Reduction::Min);
reduction_word!(word_row_min, "rmin", false, Reduction::Min);
reduction_word!(word_column_max, "cmax", true, Reduction::Max);
reduction_word!(word_row_max, "rmax", false, Reduction::Max);

/// Register the matrix construction and decomposition words.
pub fn register_matrix_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(interpreter, "minv", word_inverse, "Matrix inverse.", "M -- inv(M)");
    add_native_word!(
        interpreter,
        "pinv",
        word_pseudo_inverse,
        "Pseudo inverse.",
        "M -- pinv(M)"
    );
    add_native_word!(interpreter, "det", word_determinant, "Determinant.", "M -- det(M)");
    add_native_word!(interpreter, "eig", word_eigen, "Eigenvectors and eigenvalues.", "M -- V D");
    add_native_word!(interpreter, "tran", word_transpose, "Transpose.", "M -- M'");
    add_native_word!(interpreter, "'", word_transpose, "Transpose.", "M -- M'");
    add_native_word!(
        interpreter,
        "reshape",
        word_reshape,
        "Reshape, keeping row major order.",
        "M rows cols -- M'"
    );
    add_native_word!(
        interpreter,
        "get_aij",
        word_get_entry,
        "Copy out entry (i, j), counting from 0.",
        "M i j -- M x"
    );
    add_native_word!(
        interpreter,
        "set_aij",
        word_set_entry,
        "Replace entry (i, j), counting from 0.",
        "M x i j -- M'"
    );
    add_native_word!(interpreter, "kron", word_kronecker, "Kronecker product.", "A B -- A⊗B");
    add_native_word!(interpreter, "diag", word_diagonal, "Diagonal as a row.", "M -- row");
    add_native_word!(
        interpreter,
        "to_diag",
        word_to_diagonal,
        "Square matrix with the vector on its diagonal.",
        "vector -- M"
    );
    add_native_word!(interpreter, "chol", word_cholesky, "Lower Cholesky factor.", "M -- L");
    add_native_word!(interpreter, "svd", word_svd, "Singular value decomposition.", "M -- U S V");
    add_native_word!(interpreter, "dim", word_dimensions, "Matrix size.", "M -- M rows cols");
    add_native_word!(interpreter, "eye", word_identity, "Identity matrix.", "n -- I");
    add_native_word!(interpreter, "ones", word_ones, "Matrix of ones.", "rows cols -- M");
    add_native_word!(interpreter, "zeroes", word_zeroes, "Matrix of zeros.", "rows cols -- M");
    add_native_word!(
        interpreter,
        "rand",
        word_random,
        "Uniform random matrix.",
        "rows cols -- M"
    );
    add_native_word!(
        interpreter,
        "randn",
        word_random_normal,
        "Normal random matrix.",
        "rows cols -- M"
    );
    add_native_word!(interpreter, "rrange", word_row_range, "The row 0 to n-1.", "n -- row");
    add_native_word!(
        interpreter,
        "join_v",
        word_join_vertical,
        "Stack A above B.",
        "A B -- [A; B]"
    );
    add_native_word!(
        interpreter,
        "join_h",
        word_join_horizontal,
        "Place A left of B.",
        "A B -- [A B]"
    );
    add_native_word!(
        interpreter,
        "cumsum_r",
        word_cumulative_sum_rows,
        "Running sums along each row.",
        "M -- M'"
    );
    add_native_word!(
        interpreter,
        "cumsum_c",
        word_cumulative_sum_columns,
        "Running sums down each column.",
        "M -- M'"
    );
    add_native_word!(
        interpreter,
        "split_mat",
        word_split_matrix,
        "Push every entry, row by row.",
        "M -- entries"
    );
}

/// Register the per row and per column reductions.
pub fn register_reduction_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(interpreter, "cmean", word_column_mean, "Column means.", "M -- row");
    add_native_word!(interpreter, "rmean", word_row_mean, "Row means.", "M -- column");
    add_native_word!(interpreter, "csum", word_column_sum, "Column sums.", "M -- row");
    add_native_word!(interpreter, "rsum", word_row_sum, "Row sums.", "M -- column");
    add_native_word!(
        interpreter,
        "cvar",
        word_column_variance,
        "Column sample variances.",
        "M -- row"
    );
    add_native_word!(
        interpreter,
        "rvar",
        word_row_variance,
        "Row sample variances.",
        "M -- column"
    );
    add_native_word!(interpreter, "cmin", word_column_min, "Column minima.", "M -- row");
    add_native_word!(interpreter, "rmin", word_row_min, "Row minima.", "M -- column");
    add_native_word!(interpreter, "cmax", word_column_max, "Column maxima.", "M -- row");
    add_native_word!(interpreter, "rmax", word_row_max, "Row maxima.", "M -- column");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn real(rows: usize, cols: usize, entries: &[f64]) -> RealMatrix {
        RealMatrix::from_row_slice(rows, cols, entries)
    }

    #[test]
    fn reshape_keeps_row_major_order() {
        let m = real(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let reshaped = reshape(&m, 3, 2).unwrap();

        assert_eq!(reshaped, real(3, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]));
        assert!(reshape(&m, 4, 2).is_err());
        assert!(reshape(&m, usize::MAX, 2).is_err());
    }

    #[test]
    fn diagonal_of_a_wide_matrix_stops_at_the_short_side() {
        let m = real(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        assert_eq!(diagonal_row(&m), real(1, 2, &[1.0, 5.0]));
        assert_eq!(diagonal_row(&m.transpose()), real(1, 2, &[1.0, 5.0]));
    }

    #[test]
    fn cumulative_sums_run_in_both_directions() {
        let m = real(2, 2, &[1.0, 2.0, 3.0, 4.0]);

        assert_eq!(cumulative_sum(&m, true), real(2, 2, &[1.0, 3.0, 3.0, 7.0]));
        assert_eq!(cumulative_sum(&m, false), real(2, 2, &[1.0, 2.0, 4.0, 6.0]));
    }

    #[test]
    fn joins_check_shapes() {
        let a = real(1, 2, &[1.0, 2.0]);
        let b = real(1, 2, &[3.0, 4.0]);

        assert_eq!(join(&a, &b, true).unwrap(), real(2, 2, &[1.0, 2.0, 3.0, 4.0]));
        assert_eq!(join(&a, &b, false).unwrap(), real(1, 4, &[1.0, 2.0, 3.0, 4.0]));

        let tall = real(2, 1, &[5.0, 6.0]);
        let error = join(&a, &tall, true).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::DimensionMismatch);
    }

    #[test]
    fn column_and_row_reductions_have_the_right_shape() {
        let m = Value::MatrixReal(real(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]));

        assert_eq!(
            reduce("csum", &m, true, Reduction::Sum).unwrap(),
            Value::MatrixReal(real(1, 3, &[5.0, 7.0, 9.0]))
        );
        assert_eq!(
            reduce("rmean", &m, false, Reduction::Mean).unwrap(),
            Value::MatrixReal(real(2, 1, &[2.0, 5.0]))
        );
        assert_eq!(
            reduce("cvar", &m, true, Reduction::Variance).unwrap(),
            Value::MatrixReal(real(1, 3, &[4.5, 4.5, 4.5]))
        );
        assert_eq!(
            reduce("rmax", &m, false, Reduction::Max).unwrap(),
            Value::MatrixReal(real(2, 1, &[3.0, 6.0]))
        );
    }

    #[test]
    fn complex_minimum_is_rejected() {
        let m = Value::MatrixComplex(ComplexMatrix::from_element(2, 2, Complex::new(1.0, 1.0)));
        let error = reduce("cmin", &m, true, Reduction::Min).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn complex_eigen_pairs_satisfy_the_definition() {
        let m = real(2, 2, &[0.0, -1.0, 1.0, 0.0]).map(|x| Complex::new(x, 0.0));
        let (vectors, values) = complex_eigen(&m).unwrap();

        for (index, value) in values.iter().enumerate() {
            let v = vectors.column(index);
            let residual = &m * v - v * *value;

            assert!(residual.norm() < 1e-9);
        }
    }

    #[test]
    fn to_diagonal_needs_a_vector() {
        let row = real(1, 2, &[1.0, 2.0]);

        assert_eq!(to_diagonal(&row).unwrap(), real(2, 2, &[1.0, 0.0, 0.0, 2.0]));
        assert!(to_diagonal(&real(2, 2, &[1.0, 2.0, 3.0, 4.0])).is_err());
    }
}
