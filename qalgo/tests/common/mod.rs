use std::cell::RefCell;
use std::rc::Rc;

use num_complex::Complex;
use qreg::{DenseBackend, LinearBackend, Operator, ResourceLimits, Result};

/// Every operator handed to `apply`, with the amplitudes it acted on.
pub type ApplyLog = Rc<RefCell<Vec<(Operator, Vec<Complex<f64>>)>>>;

/// Dense backend that records each state update.
pub struct RecordingBackend {
    inner: DenseBackend,
    log: ApplyLog,
}

impl RecordingBackend {
    pub fn new(log: ApplyLog) -> Self {
        Self {
            inner: DenseBackend::new(),
            log,
        }
    }
}

impl LinearBackend for RecordingBackend {
    fn limits(&self) -> &ResourceLimits {
        self.inner.limits()
    }

    fn kron(&self, a: &Operator, b: &Operator) -> Result<Operator> {
        self.inner.kron(a, b)
    }

    fn matmul(&self, a: &Operator, b: &Operator) -> Result<Operator> {
        self.inner.matmul(a, b)
    }

    fn apply(&self, op: &Operator, amplitudes: &[Complex<f64>]) -> Result<Vec<Complex<f64>>> {
        self.log.borrow_mut().push((op.clone(), amplitudes.to_vec()));
        self.inner.apply(op, amplitudes)
    }
}
