/// Bundled snippets for trying the tool without pasting code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Sample {
    Python,
    Javascript,
}

impl Sample {
    pub fn code(&self) -> &'static str {
        match self {
            Sample::Python => PYTHON_SAMPLE,
            Sample::Javascript => JAVASCRIPT_SAMPLE,
        }
    }
}

const PYTHON_SAMPLE: &str = r#"def calculate_factorial(n):
    """Calculate the factorial of a number."""
    if n == 0 or n == 1:
        return 1
    else:
        return n * calculate_factorial(n-1)

# Calculate factorial of 5
result = calculate_factorial(5)
print(f"The factorial of 5 is {result}")"#;

const JAVASCRIPT_SAMPLE: &str = r#"function sortArray(arr) {
  // Implementation of quick sort
  if (arr.length <= 1) {
    return arr;
  }

  const pivot = arr[0];
  const left = [];
  const right = [];

  for (let i = 1; i < arr.length; i++) {
    if (arr[i] < pivot) {
      left.push(arr[i]);
    } else {
      right.push(arr[i]);
    }
  }

  return [...sortArray(left), pivot, ...sortArray(right)];
}

// Example usage
const unsortedArray = [5, 3, 7, 6, 2, 9];
console.log(sortArray(unsortedArray));"#;
