/// 입력 줄을 명령 단어로 분리
///
/// 공백으로 나누되 작은/큰따옴표 안의 공백은 유지하고, 따옴표 자체는 제거합니다.
/// 다른 종류의 따옴표 안에 있는 따옴표는 글자로 취급합니다.
/// 닫히지 않은 따옴표는 줄 끝까지 이어진 것으로 봅니다.
pub fn tokenize(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut single = false;
    let mut double = false;
    // `''` 처럼 비어 있는 따옴표 단어도 인자로 남김
    let mut quoted = false;

    for ch in line.chars() {
        match ch {
            '\'' if !double => {
                single = !single;
                quoted = true;
            }
            '"' if !single => {
                double = !double;
                quoted = true;
            }
            c if c.is_whitespace() && !single && !double => {
                if !current.is_empty() || quoted {
                    words.push(std::mem::take(&mut current));
                }
                quoted = false;
            }
            c => current.push(c),
        }
    }

    if !current.is_empty() || quoted {
        words.push(current);
    }

    words
}
