// src/common/masks.rs

// Máscaras de exibição para documentos brasileiros.
// O banco guarda só os dígitos; a máscara é aplicada na leitura e nunca persistida.

/// Aplica `groups` (tamanhos dos blocos) e `separators` entre eles.
/// Retorna o valor original se não for composto só de dígitos com o tamanho exato.
fn apply_mask(value: &str, groups: &[usize], separators: &[char]) -> String {
    let expected: usize = groups.iter().sum();
    if value.len() != expected || !value.bytes().all(|b| b.is_ascii_digit()) {
        return value.to_string();
    }

    let mut masked = String::with_capacity(expected + separators.len());
    let mut start = 0;
    for (index, size) in groups.iter().enumerate() {
        masked.push_str(&value[start..start + size]);
        start += size;
        if let Some(separator) = separators.get(index) {
            masked.push(*separator);
        }
    }
    masked
}

/// RG: `207629010` -> `20.762.901-0`
pub fn mask_rg(rg: &str) -> String {
    apply_mask(rg, &[2, 3, 3, 1], &['.', '.', '-'])
}

/// CPF: `35703019079` -> `357.030.190-79`
pub fn mask_cpf(cpf: &str) -> String {
    apply_mask(cpf, &[3, 3, 3, 2], &['.', '.', '-'])
}

/// CEP: `04013000` -> `04013-000`
pub fn mask_cep(cep: &str) -> String {
    apply_mask(cep, &[5, 3], &['-'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_rg() {
        assert_eq!(mask_rg("207629010"), "20.762.901-0");
    }

    #[test]
    fn masks_cpf() {
        assert_eq!(mask_cpf("35703019079"), "357.030.190-79");
    }

    #[test]
    fn masks_cep() {
        assert_eq!(mask_cep("04013000"), "04013-000");
    }

    #[test]
    fn every_nine_digit_rg_keeps_its_digits_in_order() {
        for seed in [0u64, 123_456_789, 999_999_999, 100_000_001] {
            let rg = format!("{:09}", seed);
            let masked = mask_rg(&rg);
            assert_eq!(masked.len(), 12);
            assert_eq!(&masked[2..3], ".");
            assert_eq!(&masked[6..7], ".");
            assert_eq!(&masked[10..11], "-");
            let digits: String = masked.chars().filter(char::is_ascii_digit).collect();
            assert_eq!(digits, rg);
        }
    }

    #[test]
    fn leaves_malformed_values_untouched() {
        assert_eq!(mask_cpf("123"), "123");
        assert_eq!(mask_cep("0401300A"), "0401300A");
        assert_eq!(mask_rg("2076290101"), "2076290101");
        assert_eq!(mask_rg(""), "");
    }
}
